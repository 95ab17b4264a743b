//! The resolved version→item→blob index.

use std::collections::BTreeMap;

/// Everything the resolver knows about one game version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionModels {
    /// Branch the version was resolved from, kept for diagnostics.
    pub branch: String,
    /// Item name (file extension stripped) to model blob reference.
    pub items: BTreeMap<String, String>,
}

/// Immutable snapshot of the version→item→blob index.
///
/// Handed out behind an `Arc`; a rebuild publishes a whole new snapshot
/// rather than mutating the one readers hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    versions: BTreeMap<String, VersionModels>,
}

impl Manifest {
    pub(crate) fn new(versions: BTreeMap<String, VersionModels>) -> Self {
        Self { versions }
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Version labels in ascending order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    pub fn version(&self, label: &str) -> Option<&VersionModels> {
        self.versions.get(label)
    }

    /// Blob reference for one item of one version.
    pub fn blob(&self, label: &str, item: &str) -> Option<&str> {
        self.versions.get(label)?.items.get(item).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        let mut items = BTreeMap::new();
        items.insert("bow".to_string(), "blob1".to_string());
        let mut versions = BTreeMap::new();
        versions.insert("1.17".to_string(), VersionModels { branch: "1.17.1".to_string(), items });
        Manifest::new(versions)
    }

    #[test]
    fn test_lookup_paths() {
        let manifest = manifest();
        assert_eq!(manifest.labels().collect::<Vec<_>>(), ["1.17"]);
        assert_eq!(manifest.blob("1.17", "bow"), Some("blob1"));
        assert_eq!(manifest.blob("1.17", "crossbow"), None);
        assert_eq!(manifest.blob("1.16", "bow"), None);
        assert!(manifest.version("1.16").is_none());
    }
}
