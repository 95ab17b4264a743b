//! In-memory asset host for testing.

use crate::AssetHost;
use crate::error::{ErrorKind, Result};
use crate::types::{Branch, TreeEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory asset host for testing.
///
/// Branches, trees, blobs and archives are plain `HashMap`s. Unknown
/// references answer with [`ErrorKind::Upstream`], and branches can be made
/// unavailable wholesale to exercise the resolver's stale-fallback path.
///
/// # Examples
///
/// ```
/// use packrat_remote::{AssetHost, Branch, MockHost, TreeEntry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let host = MockHost::default()
///     .with_branches([Branch::new("1.17", "root")])
///     .with_tree("root", [TreeEntry::blob("bow.json", "blob1")]);
/// assert_eq!(host.branches().await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockHost {
    branches: Mutex<Option<Vec<Branch>>>,
    trees: HashMap<String, Vec<TreeEntry>>,
    blobs: HashMap<String, Vec<u8>>,
    archives: HashMap<String, Vec<u8>>,
    archive_fetches: AtomicU64,
}

impl MockHost {
    pub fn with_branches(self, branches: impl IntoIterator<Item = Branch>) -> Self {
        *self.branches.lock().unwrap() = Some(branches.into_iter().collect());
        self
    }

    pub fn with_tree(mut self, sha: impl Into<String>, entries: impl IntoIterator<Item = TreeEntry>) -> Self {
        self.trees.insert(sha.into(), entries.into_iter().collect());
        self
    }

    pub fn with_blob(mut self, sha: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.blobs.insert(sha.into(), content.into());
        self
    }

    pub fn with_archive(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.archives.insert(url.into(), bytes.into());
        self
    }

    /// Make subsequent `branches()` calls fail, as if the upstream went away.
    pub fn take_branches_offline(&self) {
        *self.branches.lock().unwrap() = None;
    }

    pub fn restore_branches(&self, branches: impl IntoIterator<Item = Branch>) {
        *self.branches.lock().unwrap() = Some(branches.into_iter().collect());
    }

    /// Number of `archive()` calls served so far.
    pub fn archive_fetches(&self) -> u64 {
        self.archive_fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AssetHost for MockHost {
    async fn branches(&self) -> Result<Vec<Branch>> {
        match self.branches.lock().unwrap().clone() {
            Some(branches) => Ok(branches),
            None => exn::bail!(ErrorKind::Upstream("mock branches offline".to_string())),
        }
    }

    async fn tree(&self, sha: &str) -> Result<Vec<TreeEntry>> {
        match self.trees.get(sha) {
            Some(entries) => Ok(entries.clone()),
            None => exn::bail!(ErrorKind::Upstream(format!("mock tree {sha}"))),
        }
    }

    async fn blob(&self, sha: &str) -> Result<Vec<u8>> {
        match self.blobs.get(sha) {
            Some(content) => Ok(content.clone()),
            None => exn::bail!(ErrorKind::Upstream(format!("mock blob {sha}"))),
        }
    }

    async fn archive(&self, url: &str) -> Result<Vec<u8>> {
        self.archive_fetches.fetch_add(1, Ordering::Relaxed);
        match self.archives.get(url) {
            Some(bytes) => Ok(bytes.clone()),
            None => exn::bail!(ErrorKind::Upstream(format!("mock archive {url}"))),
        }
    }
}
