//! Liveness endpoint handler.

use axum::{http::StatusCode, response::IntoResponse};

/// Handler for the liveness probe.
///
/// Mounted at the configured liveness path, which tenant resolution skips,
/// so it answers for any host.
///
/// # HTTP Request
///
/// `GET [liveness path]` (default `/up`)
pub async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
