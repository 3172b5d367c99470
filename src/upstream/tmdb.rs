use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use super::VideoSource;
use crate::config::Config;
use crate::error::UpstreamError;
use crate::trailer::{MediaType, VideoDescriptor};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_LANGUAGE: &str = "en-US";

// TMDB rejects some requests without a browser-like agent.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/119.0.0.0 Safari/537.36";
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct VideosResponse {
    results: Vec<VideoDescriptor>,
}

/// Client for TMDB's `/{media_type}/{id}/videos` endpoint.
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    language: String,
    timeout: Duration,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TmdbClient {
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
            language: language.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.tmdb_base_url.clone(),
            config.tmdb_api_key.clone(),
            config.tmdb_language.clone(),
            config.upstream_timeout,
        )
    }

    fn videos_url(&self, media_type: MediaType, id: u64) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                UpstreamError::Transport(format!("base url {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push(media_type.as_str())
            .push(&id.to_string())
            .push("videos");
        Ok(url)
    }

    async fn request_videos(&self, url: Url) -> Result<Vec<VideoDescriptor>, UpstreamError> {
        let response = self
            .http
            .get(url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let payload = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;
        let parsed: VideosResponse = serde_json::from_slice(&payload)
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        Ok(parsed.results)
    }
}

#[async_trait]
impl VideoSource for TmdbClient {
    async fn fetch_videos(
        &self,
        media_type: MediaType,
        id: u64,
    ) -> Result<Vec<VideoDescriptor>, UpstreamError> {
        let url = self.videos_url(media_type, id)?;
        debug!(%media_type, id, path = url.path(), "fetching videos from TMDB");

        match timeout(self.timeout, self.request_videos(url)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.timeout)),
        }
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
