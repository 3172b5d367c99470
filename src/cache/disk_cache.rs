use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::{self, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;

use super::{CacheEntry, CacheStore};
use crate::error::CacheError;

/// One JSON file per key, named by the SHA-256 of the key.
pub struct DiskCache {
    cache_dir: PathBuf,
}

impl DiskCache {
    pub async fn new(cache_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).await?;
        Ok(Self { cache_dir })
    }

    fn get_cache_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hash = hex::encode(hasher.finalize());
        self.cache_dir.join(hash).with_extension("json")
    }
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let cache_path = self.get_cache_path(key);
        let data = match fs::read(&cache_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&data)?;
        if entry.is_expired() {
            debug!(key, "removing expired disk cache entry");
            if let Err(e) = fs::remove_file(&cache_path).await {
                debug!(key, error = %e, "could not remove expired entry");
            }
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn store(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let cache_path = self.get_cache_path(key);
        let cache_dir = self.cache_dir.clone();
        let data = serde_json::to_vec(entry)?;
        // each write gets its own temp file; readers never see a half-written file
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut tmp = NamedTempFile::new_in(&cache_dir)?;
            tmp.write_all(&data)?;
            tmp.persist(&cache_path)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trailer::{MediaType, Resolution, ResolvedTrailer};
    use chrono::{TimeDelta, Utc};
    use std::time::Duration;

    fn found() -> Resolution {
        Resolution::Found(ResolvedTrailer {
            media_type: MediaType::Tv,
            video_type: "Teaser".into(),
            video_name: "First Look".into(),
            url: "https://player.vimeo.com/video/42".into(),
            is_official: false,
            site: "Vimeo".into(),
            published_at: Some(Utc::now()),
        })
    }

    #[tokio::test]
    async fn stores_and_loads_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).await.unwrap();
        let entry = CacheEntry::new(found(), Duration::from_secs(60), Utc::now());

        assert!(cache.load("tv:42").await.unwrap().is_none());
        cache.store("tv:42", &entry).await.unwrap();
        assert_eq!(cache.load("tv:42").await.unwrap(), Some(entry));
    }

    #[tokio::test]
    async fn entries_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let entry = CacheEntry::new(Resolution::NotFound, Duration::from_secs(60), Utc::now());
        DiskCache::new(dir.path())
            .await
            .unwrap()
            .store("movie:9", &entry)
            .await
            .unwrap();

        let reopened = DiskCache::new(dir.path()).await.unwrap();
        assert_eq!(reopened.load("movie:9").await.unwrap(), Some(entry));
    }

    #[tokio::test]
    async fn expired_files_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).await.unwrap();
        let mut entry = CacheEntry::new(Resolution::NotFound, Duration::from_secs(60), Utc::now());
        entry.expires_at = Utc::now() - TimeDelta::seconds(1);
        cache.store("movie:1", &entry).await.unwrap();

        assert!(cache.load("movie:1").await.unwrap().is_none());
        assert!(!cache.get_cache_path("movie:1").exists());
    }

    #[tokio::test]
    async fn corrupt_files_surface_as_codec_errors() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).await.unwrap();
        fs::write(cache.get_cache_path("movie:3"), b"not json").await.unwrap();

        let err = cache.load("movie:3").await.unwrap_err();
        assert!(matches!(err, CacheError::Codec(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_do_not_clobber_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let cache = std::sync::Arc::new(DiskCache::new(dir.path()).await.unwrap());

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    let entry = CacheEntry::new(
                        Resolution::NotFound,
                        Duration::from_secs(60 + i),
                        Utc::now(),
                    );
                    cache.store("movie:5", &entry).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        assert!(cache.load("movie:5").await.unwrap().is_some());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) != Some("json"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn paths_are_hashed_keys() {
        let cache = DiskCache {
            cache_dir: PathBuf::from("/cache"),
        };
        let path = cache.get_cache_path("movie:550");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), 64 + ".json".len());
        assert!(name.ends_with(".json"));
        assert_ne!(path, cache.get_cache_path("tv:550"));
    }
}
