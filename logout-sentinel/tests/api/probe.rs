use std::time::Duration;

use logout_sentinel::{configuration::get_configuration, probe_worker::ProbeHandle};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

use crate::helpers::html_response;

fn healthy_panel_page() -> &'static str {
    concat!(
        "<html><head><title>Site administration</title></head><body>",
        "All quiet on the admin front. Sections and users are in order.",
        "</body></html>",
    )
}

#[tokio::test]
async fn the_probe_fetches_the_panel_at_the_configured_cadence() {
    // Arrange
    let admin_panel = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/"))
        .respond_with(html_response(healthy_panel_page()))
        .expect(2..)
        .mount(&admin_panel)
        .await;
    let mut configuration = get_configuration().expect("Failed to read configuration");
    configuration.upstream.base_url = admin_panel.uri();
    configuration.sentinel.probe_interval_ms = 50;

    // Act
    let probe = ProbeHandle::spawn(configuration.upstream.client(), configuration.sentinel);
    tokio::time::sleep(Duration::from_millis(220)).await;
    probe.shutdown();

    // Assert: the mounted expectation is checked when the mock server drops
}

#[tokio::test]
async fn the_probe_stops_hitting_the_panel_after_teardown() {
    // Arrange
    let admin_panel = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/"))
        .respond_with(html_response(healthy_panel_page()))
        .mount(&admin_panel)
        .await;
    let mut configuration = get_configuration().expect("Failed to read configuration");
    configuration.upstream.base_url = admin_panel.uri();
    configuration.sentinel.probe_interval_ms = 50;
    let probe = ProbeHandle::spawn(configuration.upstream.client(), configuration.sentinel);
    tokio::time::sleep(Duration::from_millis(120)).await;

    // Act
    probe.shutdown();
    // Let anything already in flight settle before taking the baseline
    tokio::time::sleep(Duration::from_millis(60)).await;
    let seen = admin_panel.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Assert
    assert!(seen >= 1);
    assert_eq!(seen, admin_panel.received_requests().await.unwrap().len());
}
