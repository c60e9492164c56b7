use axum::{http::StatusCode, response::IntoResponse};

/// Returns HTTP status code OK (200) to act as a health check for the
/// sentinel itself. This route is matched before the proxy fallback and is
/// never forwarded to the admin panel.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
