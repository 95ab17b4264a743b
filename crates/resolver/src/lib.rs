//! Version manifest resolver.
//!
//! Turns the asset repository's branch list into a manifest mapping each
//! supported game version to its item model blobs. Rebuilds are periodic
//! and serialized; when the upstream is unreachable the previously built
//! manifest keeps being served, because a slightly stale index beats an
//! error page. Only the very first build is allowed to fail loudly.

pub mod error;
mod manifest;
mod resolver;
mod version;

pub use crate::manifest::{Manifest, VersionModels};
pub use crate::resolver::Resolver;
