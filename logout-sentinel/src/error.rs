use axum::response::IntoResponse;
use http::StatusCode;

use crate::error_chain_fmt;

/// Failures the gateway can surface to a client. Everything heuristic about
/// the sentinel is deliberately not an error; the only hard failure is the
/// upstream panel being unreachable.
#[derive(thiserror::Error)]
pub enum GatewayError {
    #[error("The admin panel is currently unreachable.")]
    UpstreamUnreachable(#[source] reqwest::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:?}", self);
        let message = self.to_string();
        match self {
            GatewayError::UpstreamUnreachable(_) => {
                (StatusCode::BAD_GATEWAY, message).into_response()
            }
            GatewayError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
