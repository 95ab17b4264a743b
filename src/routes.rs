//! Route table.

use crate::state::AppState;
use crate::{api, assets, ws};
use axum::Router;
use axum::routing::get;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(assets::landing))
        .route("/index.html", get(assets::landing))
        .route("/api", get(api::index))
        .route("/api/item-models", get(api::item_models))
        .route("/api/item-models/{version}", get(api::version_models))
        .route("/api/item-models/{version}/{item}", get(api::item_model))
        .route("/api/pack", get(api::pack))
        .route("/api/registered", get(api::registered))
        .route("/api/updates", get(ws::updates))
        .fallback(assets::not_found)
        .with_state(state)
}
