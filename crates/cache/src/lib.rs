//! TTL-bound disk cache for remote fetches.
//!
//! Every upstream request in this system (branch lists aside) goes through
//! this cache. Entries are plain files under a single directory, named by a
//! deterministic transform of the source key, and their *modification time*
//! is the freshness clock. There is no index file and no sidecar metadata;
//! deleting the directory simply means everything gets fetched again.
//!
//! Two freshness policies exist, chosen per lookup:
//! - `touch = true`: a hit resets the entry's mtime, so frequently-read
//!   entries stay warm (version manifests, wiki pages, merged packs).
//! - `touch = false`: a hit leaves the mtime alone. Used for
//!   content-addressed objects (git trees and blobs, source archives) whose
//!   content can never change; refreshing their age would only delay the
//!   sweep from reclaiming disk space.

pub mod error;
mod key;
mod store;

pub use crate::key::entry_name;
pub use crate::store::DiskCache;
