//! On-disk cache of article bodies, keyed by a hash of the article URL.
//!
//! Entries never expire. A body fetched once is reused by every later run,
//! which keeps re-runs on the same day cheap and deterministic.

use sha2::{Digest, Sha256};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BodyCache {
    dir: PathBuf,
}

impl BodyCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stable cache key: lowercase hex SHA-256 of the URL.
    pub fn key(url: &str) -> String {
        format!("{:x}", Sha256::digest(url.as_bytes()))
    }

    fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", Self::key(url)))
    }

    /// Cached body for `url`, if any.
    pub async fn get(&self, url: &str) -> Option<String> {
        let path = self.path_for(url);
        match fs::read_to_string(&path).await {
            Ok(body) => {
                debug!(%url, path = %path.display(), "Body cache hit");
                Some(body)
            }
            Err(_) => None,
        }
    }

    /// Store `body` for `url`, overwriting any previous entry.
    ///
    /// Two writers racing on one URL write identical content, so the last
    /// write winning is fine.
    pub async fn put(&self, url: &str, body: &str) -> Result<(), Box<dyn Error>> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.path_for(url), body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_stable_and_distinct() {
        let a = BodyCache::key("https://tech.kakao.com/posts/1");
        assert_eq!(a, BodyCache::key("https://tech.kakao.com/posts/1"));
        assert_ne!(a, BodyCache::key("https://tech.kakao.com/posts/2"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BodyCache::new(dir.path().join("cache"));
        let url = "https://dev.to/x/post";

        assert_eq!(cache.get(url).await, None);
        cache.put(url, "body text").await.unwrap();
        assert_eq!(cache.get(url).await.as_deref(), Some("body text"));

        cache.put(url, "body text").await.unwrap();
        assert_eq!(cache.get(url).await.as_deref(), Some("body text"));
    }
}
