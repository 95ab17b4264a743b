//! Filesystem store with mtime-based expiry.

use crate::error::{ErrorKind, Result};
use crate::key::entry_name;
use std::fs::create_dir_all as sync_create_dir;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, instrument};

/// Key→bytes store where each entry is a file and its mtime is the
/// freshness clock.
///
/// Writers stage into a temporary file in the same directory and atomically
/// rename it into place, so a reader racing a writer sees either the old
/// bytes or the new bytes, never a half-written entry.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Open (creating if necessary) a cache rooted at the given directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidRoot(root));
            }
        } else {
            // Non-async is fine here; this happens once at startup and the
            // constructor stays sync.
            sync_create_dir(&root).map_err(ErrorKind::Io)?;
        }
        Ok(Self { root })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(entry_name(key))
    }

    /// Fetch an unexpired entry's payload.
    ///
    /// Returns `None` on a miss or when the entry's age exceeds `ttl`
    /// (expired entries are deleted on the way out). With `touch` set, a hit
    /// resets the entry's mtime so it stays warm under frequent access.
    pub async fn get(&self, key: &str, ttl: Duration, touch: bool) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ErrorKind::Io(e).into()),
        };
        let modified = meta.modified().map_err(ErrorKind::Io)?;
        if Self::expired(modified, ttl) {
            // A concurrent get may have already removed it; that's fine.
            if let Err(e) = fs::remove_file(&path).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                return Err(ErrorKind::Io(e).into());
            }
            return Ok(None);
        }
        let payload = fs::read(&path).await.map_err(ErrorKind::Io)?;
        if touch {
            let file = std::fs::File::options().write(true).open(&path).map_err(ErrorKind::Io)?;
            file.set_modified(SystemTime::now()).map_err(ErrorKind::Io)?;
        }
        Ok(Some(payload))
    }

    /// Store a payload, atomically replacing any previous entry.
    pub async fn put(&self, key: &str, payload: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        // Staging file must live in the cache directory itself: a rename is
        // only atomic within one filesystem.
        let staged = NamedTempFile::new_in(&self.root).map_err(ErrorKind::Io)?;
        std::fs::write(staged.path(), payload).map_err(ErrorKind::Io)?;
        staged.persist(&path).map_err(|e| ErrorKind::Io(e.error))?;
        Ok(())
    }

    /// Returns the cached payload, invoking `loader` to fill the entry on a
    /// miss or after expiry.
    ///
    /// A failed load stores nothing; the next caller retries the loader.
    pub async fn fetch_or_load<F, Fut>(&self, key: &str, ttl: Duration, touch: bool, loader: F) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        if let Some(payload) = self.get(key, ttl, touch).await? {
            return Ok(payload);
        }
        debug!(key, "cache miss, invoking loader");
        let payload = loader().await?;
        self.put(key, &payload).await?;
        Ok(payload)
    }

    /// Delete every entry older than `ttl`. Returns the number removed.
    ///
    /// Runs opportunistically (the resolver calls it before each full
    /// rebuild) rather than on a timer; stale entries only cost disk space,
    /// never correctness.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn sweep(&self, ttl: Duration) -> Result<u64> {
        let mut removed = 0u64;
        let mut entries = fs::read_dir(&self.root).await.map_err(ErrorKind::Io)?;
        while let Some(entry) = entries.next_entry().await.map_err(ErrorKind::Io)? {
            // An entry vanishing mid-sweep (concurrent expiry) is not an
            // error worth aborting the whole sweep for.
            let Ok(meta) = entry.metadata().await else { continue };
            if !meta.is_file() {
                continue;
            }
            let Ok(modified) = meta.modified() else { continue };
            if Self::expired(modified, ttl) && fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "swept expired cache entries");
        }
        Ok(removed)
    }

    fn expired(modified: SystemTime, ttl: Duration) -> bool {
        modified.elapsed().map(|age| age > ttl).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn cache() -> (tempfile::TempDir, DiskCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).unwrap();
        (dir, cache)
    }

    /// Backdate an entry's mtime so it looks `age` old.
    fn backdate(cache: &DiskCache, key: &str, age: Duration) {
        let path = cache.entry_path(key);
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_roundtrip_is_byte_identical() {
        let (_dir, cache) = cache();
        let payload = b"\x00\x01binary\xffstuff".to_vec();
        cache.put("some key", &payload).await.unwrap();
        assert_eq!(cache.get("some key", WEEK, false).await.unwrap(), Some(payload));
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let (_dir, cache) = cache();
        assert_eq!(cache.get("never stored", WEEK, false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed() {
        let (_dir, cache) = cache();
        cache.put("k", b"payload").await.unwrap();
        backdate(&cache, "k", WEEK * 2);
        assert_eq!(cache.get("k", WEEK, false).await.unwrap(), None);
        assert!(!cache.entry_path("k").exists());
    }

    #[tokio::test]
    async fn test_touch_refreshes_age() {
        let (_dir, cache) = cache();
        cache.put("k", b"payload").await.unwrap();
        backdate(&cache, "k", WEEK / 2);
        // Touching resets the clock, so the entry survives past the point
        // where the original fetch time would have expired it.
        assert!(cache.get("k", WEEK, true).await.unwrap().is_some());
        assert!(cache.get("k", WEEK / 4, false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_no_touch_preserves_age() {
        let (_dir, cache) = cache();
        cache.put("k", b"payload").await.unwrap();
        backdate(&cache, "k", WEEK / 2);
        assert!(cache.get("k", WEEK, false).await.unwrap().is_some());
        // Age was preserved, so a tighter TTL now sees it as expired.
        assert!(cache.get("k", WEEK / 4, false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_or_load_only_loads_on_miss() {
        let (_dir, cache) = cache();
        let loads = std::cell::Cell::new(0u32);
        for _ in 0..3 {
            let payload = cache
                .fetch_or_load("k", WEEK, false, || async {
                    loads.set(loads.get() + 1);
                    Ok(b"fetched".to_vec())
                })
                .await
                .unwrap();
            assert_eq!(payload, b"fetched");
        }
        assert_eq!(loads.get(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_stores_nothing() {
        let (_dir, cache) = cache();
        let result = cache
            .fetch_or_load("k", WEEK, false, || async { exn::bail!(ErrorKind::Loader) })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.get("k", WEEK, false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let (_dir, cache) = cache();
        cache.put("old", b"a").await.unwrap();
        cache.put("fresh", b"b").await.unwrap();
        backdate(&cache, "old", WEEK * 2);
        assert_eq!(cache.sweep(WEEK).await.unwrap(), 1);
        assert!(cache.get("old", WEEK, false).await.unwrap().is_none());
        assert!(cache.get("fresh", WEEK, false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_replaces_previous_entry() {
        let (_dir, cache) = cache();
        cache.put("k", b"first").await.unwrap();
        cache.put("k", b"second").await.unwrap();
        assert_eq!(cache.get("k", WEEK, false).await.unwrap(), Some(b"second".to_vec()));
    }
}
