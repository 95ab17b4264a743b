//! Layered configuration.
//!
//! Precedence, lowest to highest: built-in defaults, then a TOML file
//! (either an explicit path or `config.toml` in the platform config
//! directory), then `PACKRAT_*` environment variables. Nested keys use a
//! double underscore in the environment, so `PACKRAT_SERVER__PORT=9000`
//! sets `server.port`.

pub mod error;

use crate::error::{ErrorKind, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const ENV_PREFIX: &str = "PACKRAT_";
const CONFIG_FILE: &str = "config.toml";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "packrat")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub upstream: UpstreamConfig,
    pub registry: RegistryConfig,
    pub resolver: ResolverConfig,
}

impl Config {
    /// Load configuration, optionally from an explicit file path.
    ///
    /// A missing file is fine (defaults plus environment apply); an
    /// unreadable or malformed one is not.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let path = file.map(Path::to_path_buf).or_else(|| {
            project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        });
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            debug!(path = %path.display(), "layering config file");
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ErrorKind::Invalid(e).into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub listen: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 8080 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding cache entry files.
    pub dir: PathBuf,
    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let dir = project_dirs()
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("packrat-cache"));
        // A week: asset branches move slowly and blobs are content-addressed.
        Self { dir, ttl_secs: 7 * 24 * 60 * 60 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the source-control REST API.
    pub api_base: String,
    /// `owner/name` of the asset repository.
    pub repo: String,
    /// Version-history page scraped for human-readable version names.
    pub wiki_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            repo: "InventivetalentDev/minecraft-assets".to_string(),
            wiki_url: "https://minecraft.wiki/w/Version_history".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// SQLite database file for the item registry.
    pub db: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let db = project_dirs()
            .map(|dirs| dirs.data_dir().join("registry.db"))
            .unwrap_or_else(|| PathBuf::from("registry.db"));
        Self { db }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Seconds between manifest rebuilds.
    pub refresh_secs: u64,
}

impl ResolverConfig {
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { refresh_secs: 600 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.ttl(), Duration::from_secs(604_800));
        assert!(config.upstream.api_base.starts_with("https://"));
        assert_eq!(config.resolver.refresh(), Duration::from_secs(600));
    }

    #[test]
    fn test_file_layers_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9090\n\n[cache]\nttl_secs = 60\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.cache.ttl_secs, 60);
        // Untouched sections keep their defaults.
        assert_eq!(config.resolver.refresh_secs, 600);
    }

    #[test]
    fn test_environment_layers_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[server]\nport = 9090\n")?;
            jail.set_env("PACKRAT_SERVER__PORT", "7070");
            let config = Config::load(Some(Path::new("config.toml"))).unwrap();
            assert_eq!(config.server.port, 7070);
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = \"not a table").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
