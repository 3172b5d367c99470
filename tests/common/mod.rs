//! Shared harness for integration tests.
//!
//! [`TestHarness`] starts a wiremock server standing in for TMDB and the real
//! trailer server on a random local port, wired to each other.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::oneshot;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trailer_proxy_server::cache::{TrailerCache, TtlPolicy};
use trailer_proxy_server::proxy::ProxyServer;
use trailer_proxy_server::service::TrailerService;
use trailer_proxy_server::upstream::TmdbClient;

pub const API_KEY: &str = "integration-test-key";

pub struct TestHarness {
    pub upstream: MockServer,
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestHarness {
    pub async fn start() -> Self {
        Self::with_cache(TrailerCache::memory_only(NonZeroUsize::new(16).unwrap())).await
    }

    pub async fn with_cache(cache: TrailerCache) -> Self {
        let upstream = MockServer::start().await;
        let base = Url::parse(&format!("{}/3", upstream.uri())).unwrap();
        let client = TmdbClient::new(base, API_KEY, "en-US", Duration::from_secs(2));
        let service = Arc::new(TrailerService::new(
            Arc::new(client),
            cache,
            TtlPolicy::default(),
        ));

        let server = ProxyServer::bind("127.0.0.1:0".parse().unwrap(), service, 8)
            .await
            .expect("failed to bind test server");
        let addr = server.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server.run_until(async move {
            let _ = rx.await;
        }));

        Self {
            upstream,
            addr,
            shutdown: Some(tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Registers a `/videos` response for one media item, expected `calls` times.
    pub async fn mock_videos(&self, media_type: &str, id: u64, results: Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/3/{media_type}/{id}/videos")))
            .and(query_param("api_key", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "results": results,
            })))
            .expect(calls)
            .mount(&self.upstream)
            .await;
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let resp = reqwest::get(self.url(path)).await.expect("request failed");
        let status = resp.status().as_u16();
        let body = resp.json().await.expect("response was not JSON");
        (status, body)
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
