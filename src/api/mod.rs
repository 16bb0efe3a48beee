//! HTTP API for the karma gate
//!
//! Provides REST endpoints for:
//! - Session initiation and profile (register, me, profile, verify)
//! - Reports and karma (submit, karma lookup, chat completion, adjudication)
//!
//! Handlers return `Result<Json<T>, (StatusCode, String)>`; domain errors
//! map onto status codes in `error_response` and are never retried here.

pub mod auth;
pub mod middleware;
pub mod reports;

use axum::http::StatusCode;
use tracing::error;

use crate::karma::KarmaError;

pub use auth::{create_auth_router, AuthApiState};
pub use middleware::{require_admin_key, validate_device_token, DeviceId};
pub use reports::{create_report_router, ReportApiState};

/// Map a domain error onto its HTTP representation. Business-rule
/// violations pass through with their own message; store failures are
/// logged and masked.
pub fn error_response(err: KarmaError) -> (StatusCode, String) {
    match &err {
        KarmaError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        KarmaError::AccessDenied { .. } => (StatusCode::FORBIDDEN, err.to_string()),
        KarmaError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        KarmaError::InvalidState { .. } => (StatusCode::CONFLICT, err.to_string()),
        KarmaError::Store(inner) => {
            error!(error = %inner, "Store failure while handling request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal storage error".to_string(),
            )
        }
    }
}
