use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{field::display, Span};

use crate::{
    configuration::{SentinelSettings, Settings},
    detector::{classify, Detection},
    page::PageSignals,
    upstream::UpstreamClient,
};

pub async fn run_probe_until_stopped(configuration: Settings) -> Result<(), anyhow::Error> {
    // Set up the probe
    let upstream = configuration.upstream.client();
    probe_loop(upstream, configuration.sentinel).await
}

/// Handle to a running probe task with an explicit teardown. Tests cancel
/// the probe through it; in production the loop lives as long as the process.
pub struct ProbeHandle {
    task: tokio::task::JoinHandle<Result<(), anyhow::Error>>,
}

impl ProbeHandle {
    pub fn spawn(upstream: UpstreamClient, policy: SentinelSettings) -> Self {
        Self {
            task: tokio::spawn(probe_loop(upstream, policy)),
        }
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    PanelHealthy,
    PanelBlank,
    /// The landing page was a redirect or not an HTML document; there was
    /// nothing to inspect.
    Skipped,
}

struct ProbeStatus {
    outcome: ProbeOutcome,
    /// When the current outcome streak started, not when it was last seen.
    observed_at: DateTime<Utc>,
}

async fn probe_loop(
    upstream: UpstreamClient,
    policy: SentinelSettings,
) -> Result<(), anyhow::Error> {
    let mut status: Option<ProbeStatus> = None;
    loop {
        match probe_once(&upstream, &policy).await {
            Ok(outcome) => status = Some(report_transition(outcome, status.take())),
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to probe the admin panel",
                );
            }
        }
        tokio::time::sleep(policy.probe_interval()).await;
    }
}

/// Fetches the admin landing page and runs the blank-page detector on it.
/// A probe cannot redirect anyone; its findings are operator diagnostics.
#[tracing::instrument(
    skip_all,
    fields(
        probe_path = %policy.probe_path,
        visible_graphemes = tracing::field::Empty,
    )
)]
pub async fn probe_once(
    upstream: &UpstreamClient,
    policy: &SentinelSettings,
) -> Result<ProbeOutcome, anyhow::Error> {
    let outcome = upstream
        .fetch_page(&policy.probe_path)
        .await
        .context("Failed to fetch the admin landing page")?;
    if outcome.is_redirect() || !outcome.is_html() {
        return Ok(ProbeOutcome::Skipped);
    }
    let document = PageSignals::from_html(&outcome.text());
    match classify(&policy.probe_path, Some(&document), policy) {
        Some(Detection::BlankPage { visible_graphemes }) => {
            Span::current().record("visible_graphemes", &display(visible_graphemes));
            Ok(ProbeOutcome::PanelBlank)
        }
        // The probe chose the path itself, so the URL heuristic does not
        // apply to it.
        Some(Detection::StaleLogoutUrl) | None => Ok(ProbeOutcome::PanelHealthy),
    }
}

fn report_transition(outcome: ProbeOutcome, previous: Option<ProbeStatus>) -> ProbeStatus {
    let previous_outcome = previous.as_ref().map(|status| status.outcome);
    match outcome {
        ProbeOutcome::PanelBlank => {
            tracing::warn!("The admin panel is serving blank pages");
        }
        ProbeOutcome::PanelHealthy if previous_outcome == Some(ProbeOutcome::PanelBlank) => {
            if let Some(previous) = &previous {
                tracing::info!(
                    blank_since = %previous.observed_at,
                    "The admin panel is serving content again",
                );
            }
        }
        outcome => tracing::debug!(?outcome, "Upstream probe completed"),
    }
    match previous {
        Some(status) if status.outcome == outcome => status,
        _ => ProbeStatus {
            outcome,
            observed_at: Utc::now(),
        },
    }
}
