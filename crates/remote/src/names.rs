//! Human-readable version names, scraped from the community wiki.
//!
//! Strictly a best-effort collaborator: the wiki's markup is not a contract,
//! so every failure mode here collapses to "no name found" and callers fall
//! back to the bare version label. Nothing in the core may depend on this
//! module succeeding.

use exn::ResultExt;
use packrat_cache::DiskCache;
use packrat_cache::error::ErrorKind as CacheErrorKind;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ErrorKind, Result};

static VERSION_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+(\.\d+)?$").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").expect("static selector"));

/// Version label → display name lookup backed by a wiki page.
#[derive(Debug, Clone)]
pub struct VersionNames {
    client: reqwest::Client,
    cache: DiskCache,
    url: String,
    ttl: Duration,
}

impl VersionNames {
    pub fn new(cache: DiskCache, url: impl Into<String>, ttl: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("packrat/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Upstream("building HTTP client".to_string()))?;
        Ok(Self { client, cache, url: url.into(), ttl })
    }

    /// Display name for a single version label, if the wiki knows one.
    pub async fn lookup(&self, label: &str) -> Option<String> {
        self.table().await.remove(label)
    }

    /// The full label → display name table. Empty on any failure.
    ///
    /// The page is fetched through the cache with `touch = true` so the
    /// entry stays warm as long as anyone keeps listing versions.
    pub async fn table(&self) -> HashMap<String, String> {
        let page = self
            .cache
            .fetch_or_load(&self.url, self.ttl, true, || async {
                let response = self
                    .client
                    .get(&self.url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .or_raise(|| CacheErrorKind::Loader)?;
                let bytes = response.bytes().await.or_raise(|| CacheErrorKind::Loader)?;
                Ok(bytes.to_vec())
            })
            .await;
        match page {
            Ok(page) => Self::parse(&String::from_utf8_lossy(&page)),
            Err(e) => {
                warn!(url = %self.url, error = %e, "version name lookup failed; falling back to bare labels");
                HashMap::new()
            },
        }
    }

    /// Pull `(version label, display name)` pairs out of the page's tables.
    ///
    /// Any row whose first cell looks like a version number and whose second
    /// cell has text counts. Everything else is ignored, which is the whole
    /// resilience strategy against wiki markup churn.
    fn parse(html: &str) -> HashMap<String, String> {
        let document = Html::parse_document(html);
        let mut table = HashMap::new();
        for row in document.select(&ROW) {
            let mut cells = row.select(&CELL);
            let (Some(first), Some(second)) = (cells.next(), cells.next()) else {
                continue;
            };
            let label = first.text().collect::<String>().trim().to_string();
            let name = second.text().collect::<String>().trim().to_string();
            if VERSION_LABEL.is_match(&label) && !name.is_empty() {
                table.entry(label).or_insert(name);
            }
        }
        debug!(entries = table.len(), "parsed version name table");
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <table>
            <tr><th>Version</th><th>Name</th></tr>
            <tr><td>1.17</td><td>Caves &amp; Cliffs</td></tr>
            <tr><td>1.16</td><td>Nether Update</td></tr>
            <tr><td>not-a-version</td><td>ignored</td></tr>
            <tr><td>1.15</td><td></td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_extracts_versioned_rows() {
        let table = VersionNames::parse(PAGE);
        assert_eq!(table.get("1.17").map(String::as_str), Some("Caves & Cliffs"));
        assert_eq!(table.get("1.16").map(String::as_str), Some("Nether Update"));
        assert!(!table.contains_key("not-a-version"));
        // Empty display name is as good as no row.
        assert!(!table.contains_key("1.15"));
    }

    #[test]
    fn test_parse_survives_garbage_markup() {
        assert!(VersionNames::parse("<p>nothing tabular here").is_empty());
        assert!(VersionNames::parse("").is_empty());
    }
}
