//! Request orchestration: validate, consult the cache, fetch on a miss,
//! resolve, remember the outcome.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheLookup, TrailerCache, TtlPolicy};
use crate::error::{Error, Result};
use crate::trailer::{self, MediaType, Resolution, ResolvedTrailer};
use crate::upstream::VideoSource;

pub struct TrailerService {
    source: Arc<dyn VideoSource>,
    cache: TrailerCache,
    ttl: TtlPolicy,
}

impl TrailerService {
    pub fn new(source: Arc<dyn VideoSource>, cache: TrailerCache, ttl: TtlPolicy) -> Self {
        Self { source, cache, ttl }
    }

    /// Looks up a trailer from raw route segments.
    pub async fn lookup(&self, media_type: &str, id: &str) -> Result<ResolvedTrailer> {
        let media_type: MediaType = media_type.parse()?;
        let id = parse_id(id)?;
        self.trailer_for(media_type, id).await
    }

    /// Cache failures are logged and bypassed; they never fail a lookup.
    pub async fn trailer_for(&self, media_type: MediaType, id: u64) -> Result<ResolvedTrailer> {
        match self.cache.get(media_type, id).await {
            Ok(CacheLookup::Found(trailer)) => {
                debug!(%media_type, id, "cache hit");
                return Ok(trailer);
            }
            Ok(CacheLookup::NotFound) => {
                debug!(%media_type, id, "cache hit (no trailer)");
                return Err(Error::NotFound { media_type, id });
            }
            Ok(CacheLookup::Miss) => debug!(%media_type, id, "cache miss"),
            Err(err) => {
                warn!(%media_type, id, error = %err, "cache read failed, fetching from upstream")
            }
        }

        let videos = self
            .source
            .fetch_videos(media_type, id)
            .await
            .map_err(|source| {
                warn!(%media_type, id, error = %source, "upstream fetch failed");
                Error::Upstream {
                    media_type,
                    id,
                    source,
                }
            })?;

        let resolution = trailer::resolve(media_type, &videos);
        info!(
            %media_type,
            id,
            candidates = videos.len(),
            found = matches!(resolution, Resolution::Found(_)),
            "resolved trailer"
        );

        let ttl = self.ttl.ttl_for(&resolution);
        if let Err(err) = self.cache.put(media_type, id, &resolution, ttl).await {
            warn!(%media_type, id, error = %err, "cache write failed");
        }

        match resolution {
            Resolution::Found(trailer) => Ok(trailer),
            Resolution::NotFound => Err(Error::NotFound { media_type, id }),
        }
    }
}

fn parse_id(raw: &str) -> Result<u64> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::InvalidInput(format!(
            "id must be a positive integer, got '{raw}'"
        ))),
    }
}
