mod tmdb;

pub use tmdb::*;

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::trailer::{MediaType, VideoDescriptor};

/// Something that can list the candidate videos of a media item.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch_videos(
        &self,
        media_type: MediaType,
        id: u64,
    ) -> Result<Vec<VideoDescriptor>, UpstreamError>;
}
