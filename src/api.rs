//! JSON API handlers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::instrument;

/// How many registry facts `/api/registered` reports.
const RECENT_LIMIT: usize = 64;

pub async fn index() -> Json<[&'static str; 3]> {
    Json(["item-models", "pack", "registered"])
}

/// Supported version labels with human-readable display names. The wiki
/// lookup fails soft; a label without a known name maps to itself.
pub async fn item_models(State(state): State<AppState>) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let manifest = state.resolver.manifest().await?;
    let mut names = state.names.table().await;
    let labels = manifest
        .labels()
        .map(|label| (label.to_string(), names.remove(label).unwrap_or_else(|| label.to_string())))
        .collect();
    Ok(Json(labels))
}

pub async fn version_models(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let manifest = state.resolver.manifest().await?;
    let models = manifest.version(&version).ok_or(ApiError::NotFound)?;
    Ok(Json(models.items.clone()))
}

/// Raw model JSON, passed through from the decoded blob without reparsing.
pub async fn item_model(
    State(state): State<AppState>,
    Path((version, item)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let manifest = state.resolver.manifest().await?;
    let sha = manifest.blob(&version, &item).ok_or(ApiError::NotFound)?.to_string();
    let content = state.host.blob(&sha).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], content).into_response())
}

/// Merge the packs named by the repeated `url` query parameter, in the
/// order given. Other parameters are ignored rather than rejected.
#[instrument(skip_all)]
pub async fn pack(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let sources: Vec<String> = params
        .into_iter()
        .filter(|(key, value)| key == "url" && !value.is_empty())
        .map(|(_, value)| value)
        .collect();
    let archive = state.merger.merge(&sources).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"merged-pack.zip\""),
        ],
        archive,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredFact {
    item_name: String,
    model_number: i64,
    source_content_hash_hex: String,
    /// Unix epoch seconds.
    updated_on: i64,
}

impl From<packrat_registry::RegistryRecord> for RegisteredFact {
    fn from(record: packrat_registry::RegistryRecord) -> Self {
        Self {
            item_name: record.item_name,
            model_number: record.model_num,
            source_content_hash_hex: record.pack_hash,
            updated_on: record.updated_on.unix_timestamp(),
        }
    }
}

pub async fn registered(State(state): State<AppState>) -> Result<Json<Vec<RegisteredFact>>, ApiError> {
    let records = state.registry.recent(RECENT_LIMIT).await?;
    Ok(Json(records.into_iter().map(RegisteredFact::from).collect()))
}
