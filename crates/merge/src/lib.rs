//! Resource-pack merge engine.
//!
//! Takes an ordered list of pack archive URLs, fetches each through the disk
//! cache, and combines their item model files into one archive. Models that
//! appear in more than one source have their `overrides` lists concatenated
//! in source order. Nothing is ever dropped or replaced, because clients
//! apply the list first-match-wins and reordering it would change which
//! model an item resolves to. Every override rule carrying a numeric
//! `custom_model_data` predicate is written through to the registry,
//! attributed to the SHA-384 of the source archive it came from, and newly
//! seen facts go out on the notification bus.
//!
//! Each merge runs in its own private temporary directory; concurrent
//! merges never share filesystem state.

pub mod error;
mod merge;
mod overrides;
mod workspace;

pub use crate::merge::Merger;
