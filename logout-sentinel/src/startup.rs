use std::{net::TcpListener, sync::Arc};

use anyhow::Context;
use axum::{
    extract::FromRef,
    routing::{get, IntoMakeService},
    Router, Server,
};
use hyper::server::conn::AddrIncoming;

use crate::telemetry::RouterExt;
use crate::{
    configuration::{SentinelSettings, Settings},
    probe_worker::probe_once,
    rewrite::HtmlRewriter,
    routes::{health_check, proxy_navigation},
    upstream::UpstreamClient,
    watcher::NavigationWatcher,
};

/// The sentinel server, bound but not yet running. Holds the port it was
/// given so tests can bind port 0 and discover the real one.
pub struct Application {
    port: u16,
    server: Server<AddrIncoming, IntoMakeService<Router>>,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let upstream = configuration.upstream.client();
        let policy = configuration.sentinel;
        let rewriter = HtmlRewriter::new(&policy)
            .context("Failed to compile the logout-control patterns")?;

        // One diagnostic detector pass against the live panel. The panel
        // being unreachable at startup is not fatal; the probe keeps trying.
        match probe_once(&upstream, &policy).await {
            Ok(outcome) => {
                tracing::info!(?outcome, "Startup sweep of the admin panel completed")
            }
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Startup sweep of the admin panel failed",
                );
            }
        }

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}", address))?;
        let port = listener
            .local_addr()
            .context("Failed to read the bound address")?
            .port();
        let server = run(listener, upstream, policy, rewriter);

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> hyper::Result<()> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    upstream: UpstreamClient,
    policy: SentinelSettings,
    rewriter: HtmlRewriter,
) -> Server<AddrIncoming, IntoMakeService<Router>> {
    // Build app state
    let app_state = AppState {
        upstream: Arc::new(upstream),
        watcher: Arc::new(NavigationWatcher::new()),
        policy: Arc::new(policy),
        rewriter: Arc::new(rewriter),
    };

    // Create a router: the sentinel's own routes are matched first, every
    // other path falls through to the proxy pipeline
    let app = Router::new()
        .route("/health_check", get(health_check))
        .fallback(proxy_navigation)
        .add_axum_tracing_layer()
        .with_state(app_state);

    // Start the axum server and set up to use supplied listener
    axum::Server::from_tcp(listener)
        .expect("failed to create server from listener")
        .serve(app.into_make_service())
}

#[derive(Clone)]
pub struct AppState {
    upstream: Arc<UpstreamClient>,
    watcher: Arc<NavigationWatcher>,
    policy: Arc<SentinelSettings>,
    rewriter: Arc<HtmlRewriter>,
}

impl FromRef<AppState> for Arc<UpstreamClient> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.upstream.clone()
    }
}

impl FromRef<AppState> for Arc<NavigationWatcher> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.watcher.clone()
    }
}

impl FromRef<AppState> for Arc<SentinelSettings> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.policy.clone()
    }
}

impl FromRef<AppState> for Arc<HtmlRewriter> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rewriter.clone()
    }
}
