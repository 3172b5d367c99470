mod resolver;

pub use resolver::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The two catalogs TMDB exposes videos for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used both by our routes and by TMDB.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    /// Human wording for response messages.
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "TV show",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(Error::InvalidInput(format!(
                "unsupported media type '{other}', expected 'movie' or 'tv'"
            ))),
        }
    }
}

/// Hosting platform of a video. Unknown platforms keep their raw label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Site {
    YouTube,
    Vimeo,
    Other(String),
}

impl Site {
    pub fn label(&self) -> &str {
        match self {
            Site::YouTube => "YouTube",
            Site::Vimeo => "Vimeo",
            Site::Other(raw) => raw,
        }
    }
}

impl From<String> for Site {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "YouTube" => Site::YouTube,
            "Vimeo" => Site::Vimeo,
            _ => Site::Other(raw),
        }
    }
}

impl From<Site> for String {
    fn from(site: Site) -> Self {
        match site {
            Site::Other(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

/// TMDB video category. `Other` covers "Behind the Scenes", "Bloopers" and
/// anything TMDB adds later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VideoType {
    Trailer,
    Teaser,
    Clip,
    Featurette,
    Other(String),
}

impl VideoType {
    pub fn label(&self) -> &str {
        match self {
            VideoType::Trailer => "Trailer",
            VideoType::Teaser => "Teaser",
            VideoType::Clip => "Clip",
            VideoType::Featurette => "Featurette",
            VideoType::Other(raw) => raw,
        }
    }
}

impl From<String> for VideoType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Trailer" => VideoType::Trailer,
            "Teaser" => VideoType::Teaser,
            "Clip" => VideoType::Clip,
            "Featurette" => VideoType::Featurette,
            _ => VideoType::Other(raw),
        }
    }
}

impl From<VideoType> for String {
    fn from(video_type: VideoType) -> Self {
        match video_type {
            VideoType::Other(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

/// One entry of the `results` array of TMDB's `/{type}/{id}/videos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDescriptor {
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub site: Site,
    #[serde(rename = "type")]
    pub video_type: VideoType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub official: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// TMDB occasionally ships empty, odd or non-string timestamps; those count as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}

/// The trailer picked for a media item, in the shape the frontend consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTrailer {
    pub media_type: MediaType,
    pub video_type: String,
    pub video_name: String,
    #[serde(rename = "trailerUrl")]
    pub url: String,
    pub is_official: bool,
    pub site: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Outcome of running the selection policy over a candidate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "trailer", rename_all = "snake_case")]
pub enum Resolution {
    Found(ResolvedTrailer),
    NotFound,
}
