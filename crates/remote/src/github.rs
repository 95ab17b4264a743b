//! GitHub REST API implementation of [`AssetHost`].

use crate::AssetHost;
use crate::error::{ErrorKind, Result};
use crate::types::{BlobResponse, Branch, TreeEntry, TreeResponse};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::ResultExt;
use packrat_cache::DiskCache;
use packrat_cache::error::ErrorKind as CacheErrorKind;
use std::time::Duration;
use tracing::{debug, instrument};

// GitHub paginates branch listings; the asset repository has a few hundred
// branches, so one oversized page gets the whole set in a single request.
const BRANCH_PAGE_SIZE: u32 = 99999;

/// Asset host backed by the GitHub REST API.
///
/// Trees, blobs and archives are content-addressed upstream, so their cache
/// entries are fetched with `touch = false`: the content behind a given sha
/// or archive URL never changes, and there is no point keeping an entry
/// alive past its original TTL just because it is read often.
#[derive(Debug, Clone)]
pub struct GithubHost {
    client: reqwest::Client,
    cache: DiskCache,
    api_base: String,
    repo: String,
    ttl: Duration,
}

impl GithubHost {
    /// Create a host for `repo` (an `owner/name` pair) on the API at
    /// `api_base`, caching fetches in `cache` for `ttl`.
    pub fn new(cache: DiskCache, api_base: impl Into<String>, repo: impl Into<String>, ttl: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            // The GitHub API rejects requests without a User-Agent.
            .user_agent(concat!("packrat/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Upstream("building HTTP client".to_string()))?;
        Ok(Self {
            client,
            cache,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            repo: repo.into(),
            ttl,
        })
    }

    /// One uncached GET, any non-2xx status treated as upstream failure.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .or_raise(|| ErrorKind::Upstream(url.to_string()))?;
        let bytes = response.bytes().await.or_raise(|| ErrorKind::Upstream(url.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// GET through the disk cache, keyed by the URL itself.
    async fn cached_fetch(&self, url: &str, touch: bool) -> Result<Vec<u8>> {
        self.cache
            .fetch_or_load(url, self.ttl, touch, || async {
                self.fetch(url).await.or_raise(|| CacheErrorKind::Loader)
            })
            .await
            .or_raise(|| ErrorKind::Cache)
    }

    fn api_url(&self, tail: impl AsRef<str>) -> String {
        format!("{}/repos/{}/{}", self.api_base, self.repo, tail.as_ref())
    }
}

#[async_trait]
impl AssetHost for GithubHost {
    #[instrument(skip(self))]
    async fn branches(&self) -> Result<Vec<Branch>> {
        let url = self.api_url(format!("branches?per_page={BRANCH_PAGE_SIZE}"));
        let bytes = self.fetch(&url).await?;
        serde_json::from_slice(&bytes).or_raise(|| ErrorKind::Decode)
    }

    async fn tree(&self, sha: &str) -> Result<Vec<TreeEntry>> {
        let url = self.api_url(format!("git/trees/{sha}"));
        let bytes = self.cached_fetch(&url, false).await?;
        let response: TreeResponse = serde_json::from_slice(&bytes).or_raise(|| ErrorKind::Decode)?;
        Ok(response.tree)
    }

    async fn blob(&self, sha: &str) -> Result<Vec<u8>> {
        let url = self.api_url(format!("git/blobs/{sha}"));
        let bytes = self.cached_fetch(&url, false).await?;
        let response: BlobResponse = serde_json::from_slice(&bytes).or_raise(|| ErrorKind::Decode)?;
        if response.encoding != "base64" {
            exn::bail!(ErrorKind::Decode);
        }
        // The API inserts newlines every 60 characters of base64.
        let cleaned: String = response.content.chars().filter(|c| !c.is_whitespace()).collect();
        BASE64.decode(cleaned).or_raise(|| ErrorKind::Decode)
    }

    async fn archive(&self, url: &str) -> Result<Vec<u8>> {
        self.cached_fetch(url, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_shape() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).unwrap();
        let host = GithubHost::new(
            cache,
            "https://api.github.com/",
            "InventivetalentDev/minecraft-assets",
            Duration::from_secs(60),
        )
        .unwrap();
        assert_eq!(
            host.api_url("git/trees/abc"),
            "https://api.github.com/repos/InventivetalentDev/minecraft-assets/git/trees/abc",
        );
    }

    #[test]
    fn test_blob_envelope_decodes() {
        // "hello" in the API's newline-wrapped base64 style.
        let envelope = r#"{"content": "aGVs\nbG8=\n", "encoding": "base64", "sha": "x"}"#;
        let response: BlobResponse = serde_json::from_slice(envelope.as_bytes()).unwrap();
        let cleaned: String = response.content.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(BASE64.decode(cleaned).unwrap(), b"hello");
    }
}
