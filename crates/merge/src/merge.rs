//! The merge engine itself.

use crate::error::{ErrorKind, Result};
use crate::overrides;
use crate::workspace::Workspace;
use exn::ResultExt;
use packrat_bus::Bus;
use packrat_cache::DiskCache;
use packrat_registry::{RegistryRecord, Repository};
use packrat_remote::HostHandle;
use regex::Regex;
use sha2::{Digest, Sha384};
use std::io::Read;
use std::sync::LazyLock;
use std::time::Duration;
use time::UtcDateTime;
use tracing::{info, instrument, warn};

static MODEL_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^assets/minecraft/models/item/([^/]+)\.json$").unwrap());

/// Combines resource-pack archives in caller order, accumulating override
/// rules and writing discovered facts through the registry and bus.
#[derive(Clone)]
pub struct Merger {
    host: HostHandle,
    cache: DiskCache,
    registry: Repository,
    bus: Bus,
    ttl: Duration,
}

impl Merger {
    pub fn new(host: HostHandle, cache: DiskCache, registry: Repository, bus: Bus, ttl: Duration) -> Self {
        Self { host, cache, registry, bus, ttl }
    }

    /// Merge the given sources, strictly in the given order, into one zip.
    ///
    /// The result is cached under a key derived from the canonicalized
    /// ordered source list, so repeating the same request within the TTL
    /// returns byte-identical output without touching the sources again.
    /// `[A, B]` and `[B, A]` are different requests: later sources' rules
    /// land after earlier ones', and that order is load-bearing.
    ///
    /// Any unreachable source aborts the whole merge and caches nothing;
    /// the error is retryable. A registry write failure only drops that one
    /// record.
    #[instrument(skip(self), fields(sources = sources.len()))]
    pub async fn merge(&self, sources: &[String]) -> Result<Vec<u8>> {
        if sources.is_empty() {
            exn::bail!(ErrorKind::NoSources);
        }
        let key = request_key(sources);
        if let Some(archive) = self.cache.get(&key, self.ttl, true).await.or_raise(|| ErrorKind::Cache)? {
            return Ok(archive);
        }
        let archive = self.merge_uncached(sources).await?;
        self.cache.put(&key, &archive).await.or_raise(|| ErrorKind::Cache)?;
        info!(sources = sources.len(), bytes = archive.len(), "merged pack archive");
        Ok(archive)
    }

    async fn merge_uncached(&self, sources: &[String]) -> Result<Vec<u8>> {
        let workspace = Workspace::new()?;
        for url in sources {
            let bytes = self.host.archive(url).await.or_raise(|| ErrorKind::Upstream(url.clone()))?;
            let pack_hash = format!("{:x}", Sha384::digest(&bytes));
            let found = apply_source(&workspace, url, &bytes)?;
            let now = UtcDateTime::now();
            for (item, model_num) in found {
                let record = RegistryRecord::new(item, model_num, &pack_hash, now);
                match self.registry.record(&record).await {
                    Ok(true) => self.bus.publish(record),
                    Ok(false) => {},
                    // A lost record must not fail an otherwise-good merge.
                    Err(e) => warn!(item = %record.item_name, error = %e, "dropping registry record"),
                }
            }
        }
        workspace.archive()
    }
}

/// Extract or merge one source archive's item models into the workspace.
///
/// Returns every override rule with a numeric custom-model-data predicate
/// that this source contributed, as `(item, model number)` pairs in entry
/// order.
fn apply_source(workspace: &Workspace, url: &str, archive: &[u8]) -> Result<Vec<(String, i64)>> {
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive))
        .or_raise(|| ErrorKind::InvalidArchive(url.to_string()))?;
    let mut found = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).or_raise(|| ErrorKind::InvalidArchive(url.to_string()))?;
        let Some(item) = MODEL_ENTRY
            .captures(entry.name())
            .and_then(|captures| captures.get(1))
            .map(|name| name.as_str().to_string())
        else {
            continue;
        };
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).map_err(ErrorKind::Io)?;
        if workspace.has_model(&item) {
            let incoming: serde_json::Value =
                serde_json::from_slice(&contents).or_raise(|| ErrorKind::InvalidModel(item.clone()))?;
            let mut existing = workspace.read_model(&item)?;
            let appended = overrides::append_rules(&mut existing, &incoming);
            workspace.write_model(&item, &existing)?;
            found.extend(
                appended.iter().filter_map(overrides::custom_model_data).map(|num| (item.clone(), num)),
            );
        } else {
            // First sighting: the file lands verbatim. Its own rules still
            // count as contributed by this source.
            workspace.write_raw(&item, &contents)?;
            if let Ok(model) = serde_json::from_slice::<serde_json::Value>(&contents) {
                found.extend(
                    overrides::rules(&model)
                        .iter()
                        .filter_map(overrides::custom_model_data)
                        .map(|num| (item.clone(), num)),
                );
            }
        }
    }
    Ok(found)
}

/// Deterministic cache key for an ordered source list.
fn request_key(sources: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    for url in sources {
        hasher.update(url.as_bytes());
        hasher.update(b"\n");
    }
    format!("pack-{}", hasher.finalize().to_hex())
}
