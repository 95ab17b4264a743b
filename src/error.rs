//! Server Error Types
//!
//! Startup errors use `exn` like every other crate; request-path errors are
//! a small axum-facing type that maps straight to a status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error};
use packrat_merge::error::ErrorKind as MergeErrorKind;

/// A startup error with automatic location tracking.
pub type SetupError = exn::Exn<SetupErrorKind>;
/// Result type alias for startup wiring.
pub type SetupResult<T> = std::result::Result<T, SetupError>;

/// Things that can go wrong before the server accepts traffic. All fatal.
#[derive(Debug, Display, Error)]
pub enum SetupErrorKind {
    #[display("configuration failed to load")]
    Config,
    #[display("cache directory unusable")]
    Cache,
    #[display("registry database unavailable")]
    Database,
    #[display("upstream client failed to initialize")]
    Upstream,
    #[display("initial manifest build failed")]
    Manifest,
    #[display("could not bind {_0}")]
    Bind(#[error(not(source))] std::net::SocketAddr),
}

/// Request-path failure, rendered as a plain status and message.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Usage(String),
    Upstream,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            Self::Usage(message) => (StatusCode::BAD_REQUEST, message),
            Self::Upstream => (StatusCode::BAD_GATEWAY, "upstream source unavailable, try again".to_string()),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
        }
        .into_response()
    }
}

impl From<packrat_merge::error::Error> for ApiError {
    fn from(error: packrat_merge::error::Error) -> Self {
        match &*error {
            MergeErrorKind::NoSources => {
                Self::Usage("expected at least one source: /api/pack?url=...&url=...".to_string())
            },
            MergeErrorKind::Upstream(_) | MergeErrorKind::InvalidArchive(_) | MergeErrorKind::InvalidModel(_) => {
                Self::Upstream
            },
            MergeErrorKind::Io(_) | MergeErrorKind::Cache => Self::Internal,
        }
    }
}

impl From<packrat_resolver::error::Error> for ApiError {
    fn from(_: packrat_resolver::error::Error) -> Self {
        // Post-startup the resolver falls back to its stale manifest, so an
        // error here means it never had one, which the startup check rules
        // out. Degrade politely anyway.
        Self::Upstream
    }
}

impl From<packrat_remote::error::Error> for ApiError {
    fn from(_: packrat_remote::error::Error) -> Self {
        Self::Upstream
    }
}

impl From<packrat_registry::error::Error> for ApiError {
    fn from(_: packrat_registry::error::Error) -> Self {
        Self::Internal
    }
}
