//! Durable registry of custom-model-data facts.
//!
//! Unlike the disk cache, this database is not rebuildable from anywhere:
//! it is the system's only record of which `(item, model number)` pairs have
//! been seen in which source pack. Rows are keyed by the full
//! `(item_name, model_num, pack_hash)` triple, so re-merging the same pack
//! is a timestamp refresh, never a second row. Ingestion is idempotent and
//! the notification fan-out can trust "newly inserted" to mean exactly that.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::RegistryRecord;
pub use crate::repo::Repository;
