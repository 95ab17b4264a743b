//! Embedded static pages.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

fn page(name: &str) -> Option<String> {
    Assets::get(name).map(|file| String::from_utf8_lossy(&file.data).into_owned())
}

/// The landing page, baked into the binary so the server has no runtime
/// dependency on its working directory.
pub async fn landing() -> Response {
    match page("index.html") {
        Some(body) => Html(body).into_response(),
        None => not_found().await.into_response(),
    }
}

pub async fn not_found() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::NOT_FOUND,
        Html("<!DOCTYPE html><html><body><h1>404</h1><p>Nothing lives at this path.</p></body></html>"),
    )
}
