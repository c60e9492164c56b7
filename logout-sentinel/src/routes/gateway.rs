use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use http::StatusCode;
use tokio::time::sleep;

use crate::{
    configuration::SentinelSettings,
    detector::{classify, Detection},
    error::GatewayError,
    page::PageSignals,
    redirect::{ForcedRedirect, RedirectReason},
    rewrite::HtmlRewriter,
    upstream::{UpstreamClient, UpstreamResponse},
    watcher::NavigationWatcher,
};

/// The proxy pipeline, mounted as the router fallback so that every path
/// except the sentinel's own routes flows through it.
///
/// Order per request: record the navigation, forward to the panel, run the
/// failure detector on the answer, apply the logout-outcome rule, and
/// finally arm logout controls in delivered admin HTML. First matching rule
/// wins; at most one forced redirect is issued per request.
#[cfg_attr(any(test, debug_assertions), debug_handler(state = crate::startup::AppState))]
#[tracing::instrument(
    name = "Proxy a navigation",
    skip_all,
    fields(
        http_method = %request.method(),
        path = %request.uri().path(),
        decision = tracing::field::Empty,
    )
)]
pub async fn proxy_navigation(
    State(upstream): State<Arc<UpstreamClient>>,
    State(watcher): State<Arc<NavigationWatcher>>,
    State(policy): State<Arc<SentinelSettings>>,
    State(rewriter): State<Arc<HtmlRewriter>>,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let path = request.uri().path().to_string();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|value| value.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    watcher.observe(&path);

    let (parts, body) = request.into_parts();
    let body = hyper::body::to_bytes(body)
        .await
        .context("Failed to buffer the request body")?;
    let outcome = upstream
        .forward(parts.method, &path_and_query, parts.headers, body)
        .await
        .map_err(GatewayError::UpstreamUnreachable)?;

    if !policy.is_admin_path(&path) {
        return Ok(outcome.into_response());
    }

    // The detector only sees delivered documents; redirects and non-HTML
    // answers carry no page to inspect.
    let document = (!outcome.is_redirect() && outcome.is_html())
        .then(|| PageSignals::from_html(&outcome.text()));
    if let Some(document) = document.as_ref() {
        if let Some(detection) = classify(&path, Some(document), &policy) {
            if let Some(response) = apply_detection(detection, &path, &policy).await {
                return Ok(response);
            }
        }
    }

    if policy.is_logout_request(&path) {
        let landing = outcome.location().map(landing_path).unwrap_or(&path);
        if policy.is_admin_path(landing) && !policy.lands_on_login(landing) {
            tracing::Span::current()
                .record("decision", &tracing::field::debug(RedirectReason::LogoutFallback));
            tracing::warn!(
                landing = %landing,
                "Logout did not leave the admin section",
            );
            sleep(policy.click_grace()).await;
            return Ok(
                ForcedRedirect::to_login(RedirectReason::LogoutFallback, &policy).into_response(),
            );
        }
        // A logout that worked is never touched.
        return Ok(outcome.into_response());
    }

    Ok(deliver(outcome, &rewriter).into_response())
}

/// Turns a detector finding into the forced redirect, honoring the deferral
/// for the stale-logout case and suppressing redirects that would target the
/// path the client is already on.
async fn apply_detection(
    detection: Detection,
    path: &str,
    policy: &SentinelSettings,
) -> Option<Response> {
    let (reason, deferral) = match detection {
        Detection::BlankPage { visible_graphemes } => {
            tracing::warn!(
                visible_graphemes,
                path = %path,
                "Blank page detected after navigation",
            );
            (RedirectReason::BlankPage, None)
        }
        Detection::StaleLogoutUrl => {
            tracing::warn!(path = %path, "Navigation parked on the logout URL");
            (RedirectReason::StaleLogoutUrl, Some(policy.logout_deferral()))
        }
    };
    let redirect = ForcedRedirect::to_login(reason, policy);
    if redirect.is_noop_for(path) {
        tracing::debug!(path = %path, "Suppressing a redirect to the current path");
        return None;
    }
    tracing::Span::current().record("decision", &tracing::field::debug(reason));
    if let Some(deferral) = deferral {
        sleep(deferral).await;
    }
    Some(redirect.into_response())
}

/// Arms logout controls in a delivered admin page. Anything that is not a
/// plain 200 HTML document is passed through unchanged.
fn deliver(outcome: UpstreamResponse, rewriter: &HtmlRewriter) -> UpstreamResponse {
    if outcome.status() != StatusCode::OK || !outcome.is_html() {
        return outcome;
    }
    let rewritten = rewriter.arm_logout_controls(&outcome.text());
    if rewritten.armed_controls == 0 && !rewritten.shim_injected {
        return outcome;
    }
    tracing::debug!(
        armed_controls = rewritten.armed_controls,
        shim_injected = rewritten.shim_injected,
        "Armed logout controls in the proxied document",
    );
    outcome.with_body(rewritten.html)
}

/// A `Location` header may carry an absolute URL; decisions are made on the
/// path alone.
fn landing_path(location: &str) -> &str {
    match location.find("://") {
        Some(scheme_end) => {
            let after_scheme = &location[scheme_end + 3..];
            match after_scheme.find('/') {
                Some(path_start) => &after_scheme[path_start..],
                None => "/",
            }
        }
        None => location,
    }
}
