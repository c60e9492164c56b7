use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{assert_is_redirect_to, html_response, spawn_app, spawn_app_with};

#[tokio::test]
async fn a_logout_bounced_back_into_the_admin_section_is_overridden() {
    // Arrange
    let app = spawn_app_with(|c| {
        // The grace delay is measured in its own test
        c.sentinel.click_grace_ms = 50;
    })
    .await;
    Mock::given(method("GET"))
        .and(path("/admin/logout/"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/admin/dashboard"))
        .expect(1)
        .mount(&app.admin_panel)
        .await;

    // Act
    let response = app.get("/admin/logout/").await;

    // Assert
    assert_is_redirect_to(&response, &app.sentinel.login_path);
    assert_eq!(
        "\"storage\"",
        response.headers().get("clear-site-data").unwrap()
    );
}

#[tokio::test]
async fn the_override_waits_out_the_grace_delay() {
    // Arrange
    let app = spawn_app().await;
    let body = concat!(
        "<html><head><title>Signing out</title></head><body>",
        "Hold on while we close your session and tidy up after your visit.",
        "</body></html>",
    );
    // A logout-looking path that is not the canonical logout URL, answered
    // with a page that still sits inside the admin section
    Mock::given(method("GET"))
        .and(path("/admin/logout"))
        .respond_with(html_response(body))
        .mount(&app.admin_panel)
        .await;

    // Act
    let started = std::time::Instant::now();
    let response = app.get("/admin/logout").await;
    let elapsed = started.elapsed();

    // Assert
    assert_is_redirect_to(&response, &app.sentinel.login_path);
    assert!(elapsed >= app.sentinel.click_grace());
}

#[tokio::test]
async fn a_working_logout_is_passed_through_untouched() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/admin/logout/"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/admin/login/?next=/admin/"),
        )
        .expect(1)
        .mount(&app.admin_panel)
        .await;

    // Act
    let response = app.get("/admin/logout/").await;

    // Assert
    assert_eq!(302, response.status().as_u16());
    assert_eq!(
        "/admin/login/?next=/admin/",
        response.headers().get("Location").unwrap()
    );
    assert!(response.headers().get("clear-site-data").is_none());
}

#[tokio::test]
async fn a_blank_logout_outcome_is_handled_before_the_grace_delay() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/admin/logout/"))
        .respond_with(html_response("<html><head></head><body></body></html>"))
        .mount(&app.admin_panel)
        .await;

    // Act
    let started = std::time::Instant::now();
    let response = app.get("/admin/logout/").await;
    let elapsed = started.elapsed();

    // Assert
    // The blank-page rule wins and fires immediately; the grace delay never
    // comes into play.
    assert_is_redirect_to(&response, &app.sentinel.login_path);
    assert!(elapsed < app.sentinel.click_grace());
}

#[tokio::test]
async fn the_forced_redirect_still_navigates_without_the_storage_capability() {
    // Arrange
    let app = spawn_app_with(|c| {
        c.sentinel.clear_storage = false;
        c.sentinel.click_grace_ms = 50;
    })
    .await;
    Mock::given(method("GET"))
        .and(path("/admin/logout/"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/admin/"))
        .mount(&app.admin_panel)
        .await;

    // Act
    let response = app.get("/admin/logout/").await;

    // Assert
    assert_is_redirect_to(&response, &app.sentinel.login_path);
    assert!(response.headers().get("clear-site-data").is_none());
}

#[tokio::test]
async fn a_posted_logout_is_forwarded_before_its_outcome_is_judged() {
    // Arrange
    let app = spawn_app_with(|c| {
        c.sentinel.click_grace_ms = 50;
    })
    .await;
    Mock::given(method("POST"))
        .and(path("/admin/logout/"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/admin/"))
        .expect(1)
        .mount(&app.admin_panel)
        .await;

    // Act
    let response = app
        .post_form(
            "/admin/logout/",
            &serde_json::json!({ "csrfmiddlewaretoken": "dummy-token" }),
        )
        .await;

    // Assert
    // The default action ran upstream exactly once; only its outcome was
    // replaced.
    assert_is_redirect_to(&response, &app.sentinel.login_path);
}
