//! Wire types for the slices of the GitHub REST API this crate touches.

use serde::Deserialize;

/// A branch in the asset repository. One branch per game version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: Commit,
}
impl Branch {
    /// Convenience constructor, mostly for tests and the mock host.
    pub fn new(name: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit: Commit { sha: sha.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub sha: String,
}

/// One entry of a git tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
}
impl TreeEntry {
    pub fn tree(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self { path: path.into(), sha: sha.into(), kind: TreeEntryKind::Tree }
    }

    pub fn blob(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self { path: path.into(), sha: sha.into(), kind: TreeEntryKind::Blob }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    /// Submodule pointer; never followed, only skipped.
    Commit,
}

/// Envelope the trees endpoint wraps its entries in.
#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    pub tree: Vec<TreeEntry>,
}

/// Envelope the blobs endpoint wraps file content in.
#[derive(Debug, Deserialize)]
pub(crate) struct BlobResponse {
    pub content: String,
    pub encoding: String,
}
