use axum::response::{IntoResponse, Redirect};
use http::header::{HeaderName, HeaderValue};
use uuid::Uuid;

use crate::configuration::SentinelSettings;

/// Why a forced redirect was issued; rendered into the decision log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectReason {
    BlankPage,
    StaleLogoutUrl,
    LogoutFallback,
}

impl std::fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            RedirectReason::BlankPage => "blank page detected after navigation",
            RedirectReason::StaleLogoutUrl => "navigation parked on the logout URL",
            RedirectReason::LogoutFallback => "logout did not leave the admin section",
        };
        write!(f, "{}", reason)
    }
}

/// A forced navigation to the login page, the sentinel's one repair action.
/// Building one is cheap and side-effect free; the decision is logged when
/// the response is actually produced.
pub struct ForcedRedirect {
    target: String,
    reason: RedirectReason,
    decision_id: Uuid,
    clear_storage: bool,
}

impl ForcedRedirect {
    pub fn to_login(reason: RedirectReason, policy: &SentinelSettings) -> Self {
        Self {
            target: policy.login_path.clone(),
            reason,
            decision_id: Uuid::new_v4(),
            clear_storage: policy.clear_storage,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn reason(&self) -> RedirectReason {
        self.reason
    }

    /// A redirect pointed at the path the client is already on would loop;
    /// such a repair is suppressed and the response passes through instead.
    pub fn is_noop_for(&self, current_path: &str) -> bool {
        self.target == current_path
    }
}

impl IntoResponse for ForcedRedirect {
    fn into_response(self) -> axum::response::Response {
        tracing::info!(
            decision_id = %self.decision_id,
            reason = %self.reason,
            target = %self.target,
            clear_storage = self.clear_storage,
            "Forcing redirect to the login page"
        );
        let mut response = Redirect::to(&self.target).into_response();
        if self.clear_storage {
            // Instructs the browser to drop local and session storage; only
            // honored on secure origins, hence the capability flag.
            response.headers_mut().insert(
                HeaderName::from_static("clear-site-data"),
                HeaderValue::from_static("\"storage\""),
            );
        }
        response
    }
}
