use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

use crate::cache::{CacheBackend, TtlPolicy, DEFAULT_FOUND_TTL, DEFAULT_NOT_FOUND_TTL};
use crate::error::{Error, Result};
use crate::upstream::{DEFAULT_BASE_URL, DEFAULT_LANGUAGE};

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;
pub const DEFAULT_CACHE_CAPACITY: usize = 100;
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the process needs, resolved once at startup and passed down.
#[derive(Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub tmdb_api_key: String,
    pub tmdb_base_url: Url,
    pub tmdb_language: String,
    pub max_connections: usize,
    pub cache_capacity: NonZeroUsize,
    pub cache_backend: CacheBackend,
    pub upstream_timeout: Duration,
    pub ttl: TtlPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("tmdb_api_key", &"<redacted>")
            .field("tmdb_base_url", &self.tmdb_base_url.as_str())
            .field("tmdb_language", &self.tmdb_language)
            .field("max_connections", &self.max_connections)
            .field("cache_capacity", &self.cache_capacity)
            .field("cache_backend", &self.cache_backend.describe())
            .field("upstream_timeout", &self.upstream_timeout)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let tmdb_api_key =
            get("TMDB_API_KEY").ok_or_else(|| Error::Config("TMDB_API_KEY not set".into()))?;

        let base_raw = get("TMDB_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let tmdb_base_url = Url::parse(&base_raw)
            .map_err(|e| Error::Config(format!("TMDB_BASE_URL '{base_raw}' is invalid: {e}")))?;
        if !matches!(tmdb_base_url.scheme(), "http" | "https") || tmdb_base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "TMDB_BASE_URL '{base_raw}' must be an http(s) URL"
            )));
        }

        let tmdb_language = get("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let host: IpAddr = parse_or(&get, "HOST", DEFAULT_HOST)?;
        let port: u16 = parse_or(&get, "PORT", DEFAULT_PORT)?;

        let max_connections: usize = parse_or(&get, "MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(Error::Config("MAX_CONNECTIONS must be greater than zero".into()));
        }
        if max_connections > Semaphore::MAX_PERMITS {
            return Err(Error::Config(format!(
                "MAX_CONNECTIONS must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }

        let cache_capacity = NonZeroUsize::new(parse_or(
            &get,
            "CACHE_CAPACITY",
            DEFAULT_CACHE_CAPACITY,
        )?)
        .ok_or_else(|| Error::Config("CACHE_CAPACITY must be greater than zero".into()))?;

        let cache_backend = match get("CACHE_URL") {
            Some(raw) => CacheBackend::parse(&raw)?,
            None => CacheBackend::Memory,
        };

        let timeout_secs: u64 = parse_or(
            &get,
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(Error::Config("UPSTREAM_TIMEOUT_SECS must be greater than zero".into()));
        }

        let ttl = TtlPolicy::new(
            Duration::from_secs(parse_or(&get, "CACHE_TTL_FOUND_SECS", DEFAULT_FOUND_TTL.as_secs())?),
            Duration::from_secs(parse_or(
                &get,
                "CACHE_TTL_NOT_FOUND_SECS",
                DEFAULT_NOT_FOUND_TTL.as_secs(),
            )?),
        )?;

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            tmdb_api_key,
            tmdb_base_url,
            tmdb_language,
            max_connections,
            cache_capacity,
            cache_backend,
            upstream_timeout: Duration::from_secs(timeout_secs),
            ttl,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("parsing {key}='{raw}': {e}"))),
        None => Ok(default),
    }
}
