//! Manifest building and refresh scheduling.

use crate::error::{ErrorKind, Result};
use crate::manifest::{Manifest, VersionModels};
use crate::version::select_branches;
use exn::ResultExt;
use packrat_cache::DiskCache;
use packrat_remote::{HostHandle, TreeEntryKind};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Directory segments from a branch's root tree down to the item models.
const MODEL_PATH: [&str; 4] = ["assets", "minecraft", "models", "item"];

struct State {
    manifest: Arc<Manifest>,
    refreshed_at: Option<Instant>,
}

/// Builds and serves the version manifest, rebuilding it from the asset
/// host once the refresh interval has passed.
///
/// The state lock is held across a rebuild, so at most one rebuild is ever
/// in flight; callers arriving during one wait for its result instead of
/// starting their own. When a rebuild fails and a previous manifest exists,
/// that stale manifest keeps being served. A first build that fails is an
/// error the caller decides about (at startup that means refusing to serve).
pub struct Resolver {
    host: HostHandle,
    cache: DiskCache,
    refresh: Duration,
    cache_ttl: Duration,
    state: Mutex<State>,
}

impl Resolver {
    pub fn new(host: HostHandle, cache: DiskCache, refresh: Duration, cache_ttl: Duration) -> Self {
        Self {
            host,
            cache,
            refresh,
            cache_ttl,
            state: Mutex::new(State { manifest: Arc::new(Manifest::default()), refreshed_at: None }),
        }
    }

    /// The current manifest, rebuilding first if the refresh interval has
    /// passed.
    #[instrument(skip(self))]
    pub async fn manifest(&self) -> Result<Arc<Manifest>> {
        let mut state = self.state.lock().await;
        if let Some(refreshed_at) = state.refreshed_at
            && refreshed_at.elapsed() < self.refresh
        {
            return Ok(state.manifest.clone());
        }
        // Expired entries are reaped on the rebuild cadence; a failed sweep
        // only costs disk space.
        if let Err(error) = self.cache.sweep(self.cache_ttl).await {
            warn!(%error, "cache sweep failed");
        }
        match self.rebuild().await {
            Ok(manifest) if !manifest.is_empty() => {
                let manifest = Arc::new(manifest);
                state.manifest = manifest.clone();
                state.refreshed_at = Some(Instant::now());
                info!(versions = manifest.labels().count(), "manifest rebuilt");
                Ok(manifest)
            },
            Ok(_) if state.refreshed_at.is_none() => exn::bail!(ErrorKind::NoVersions),
            Err(error) if state.refreshed_at.is_none() => Err(error),
            outcome => {
                // Availability over freshness: keep serving what we had.
                match outcome {
                    Ok(_) => warn!("rebuild found no versions, keeping previous manifest"),
                    Err(error) => warn!(%error, "rebuild failed, keeping previous manifest"),
                }
                Ok(state.manifest.clone())
            },
        }
    }

    async fn rebuild(&self) -> Result<Manifest> {
        let branches = self.host.branches().await.or_raise(|| ErrorKind::Upstream)?;
        let mut versions = BTreeMap::new();
        for (label, branch) in select_branches(&branches) {
            match self.walk_models(&branch.commit.sha).await? {
                Some(items) => {
                    versions.insert(label, VersionModels { branch: branch.name, items });
                },
                // A version branch without the item model directory has
                // nothing to offer; the rest of the rebuild proceeds.
                None => warn!(branch = %branch.name, "item model directory missing, skipping version"),
            }
        }
        Ok(Manifest::new(versions))
    }

    /// Follow [`MODEL_PATH`] from a root tree and index the item models at
    /// the bottom. `None` when a path segment is absent.
    async fn walk_models(&self, root: &str) -> Result<Option<BTreeMap<String, String>>> {
        let mut sha = root.to_string();
        for segment in MODEL_PATH {
            let entries = self.host.tree(&sha).await.or_raise(|| ErrorKind::Upstream)?;
            let Some(child) = entries
                .iter()
                .find(|entry| entry.kind == TreeEntryKind::Tree && entry.path == segment)
            else {
                return Ok(None);
            };
            sha = child.sha.clone();
        }
        let entries = self.host.tree(&sha).await.or_raise(|| ErrorKind::Upstream)?;
        let items = entries
            .into_iter()
            .filter(|entry| entry.kind == TreeEntryKind::Blob)
            .filter_map(|entry| {
                entry.path.strip_suffix(".json").map(|item| (item.to_string(), entry.sha))
            })
            .collect();
        Ok(Some(items))
    }
}
