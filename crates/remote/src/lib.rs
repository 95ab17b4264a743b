//! Remote source-control host client.
//!
//! The asset repository lives on GitHub (`InventivetalentDev/minecraft-assets`,
//! one branch per game version) and is only ever read through its REST API:
//! branch listings, git trees, git blobs, plus arbitrary archive downloads
//! for the pack merger. Everything except the branch list goes through the
//! [`DiskCache`](packrat_cache::DiskCache). Branch listings must always
//! reflect the live branch set, so they are fetched fresh every time.
//!
//! The [`AssetHost`] trait is the seam for tests: [`GithubHost`] is the real
//! implementation, [`MockHost`] (behind the `mock` feature) backs unit tests
//! with in-memory maps.

pub mod error;
mod github;
#[cfg(feature = "mock")]
mod mock;
mod names;
mod types;

pub use crate::github::GithubHost;
#[cfg(feature = "mock")]
pub use crate::mock::MockHost;
pub use crate::names::VersionNames;
pub use crate::types::{Branch, TreeEntry, TreeEntryKind};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub type HostHandle = Arc<dyn AssetHost + Send + Sync>;

/// Read-only view of the remote asset repository.
// TODO: When `dyn async trait` stabilizes, migrate to native 2024 Edition async traits.
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Fetch the full branch list.
    ///
    /// Never cached: the branch set is the one piece of upstream state that
    /// must always be current, since new game versions appear as new
    /// branches.
    async fn branches(&self) -> Result<Vec<Branch>>;

    /// Fetch a git tree listing by its content-addressed reference.
    async fn tree(&self, sha: &str) -> Result<Vec<TreeEntry>>;

    /// Fetch a git blob's raw content by its content-addressed reference.
    async fn blob(&self, sha: &str) -> Result<Vec<u8>>;

    /// Fetch an arbitrary archive by URL (resource packs for the merger).
    async fn archive(&self, url: &str) -> Result<Vec<u8>>;
}
