//! Shared handles every request handler gets a clone of.

use packrat_bus::Bus;
use packrat_merge::Merger;
use packrat_registry::Repository;
use packrat_remote::{HostHandle, VersionNames};
use packrat_resolver::Resolver;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub names: VersionNames,
    pub host: HostHandle,
    pub merger: Merger,
    pub registry: Repository,
    pub bus: Bus,
}
