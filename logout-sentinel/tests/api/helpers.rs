use logout_sentinel::{
    configuration::{get_configuration, SentinelSettings, Settings},
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use wiremock::{MockServer, ResponseTemplate};

static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            "test".into(),
            "logout_sentinel=debug,info".into(),
            std::io::stdout,
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            "test".into(),
            "logout_sentinel=debug,info".into(),
            std::io::sink,
        );
        init_subscriber(subscriber);
    }
});

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Starts the sentinel in front of a fresh mock admin panel. The hook can
/// adjust settings before the server starts, e.g. shorten the grace delays
/// a test does not measure.
pub async fn spawn_app_with(customise: impl FnOnce(&mut Settings)) -> TestApp {
    // Set up subscriber for logging, only first time per run. Other times use existing subscriber.
    Lazy::force(&TRACING);

    // The mock server plays the admin panel the sentinel fronts. It must be
    // a bare (non-pooled) server: dropping it has to close its port so a test
    // can simulate an unreachable panel, while a pooled server keeps
    // listening and answers 404 instead.
    let admin_panel = MockServer::builder().start().await;
    let configuration = {
        // Get the configuration from file
        let mut c = get_configuration().expect("Failed to read configuration");
        // Use a random OS port
        c.application.port = 0;
        c.upstream.base_url = admin_panel.uri();
        customise(&mut c);
        c
    };
    let sentinel = configuration.sentinel.clone();

    // Start the server
    let app = Application::build(configuration)
        .await
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", app.port());
    tokio::spawn(app.run_until_stopped());

    // Redirects stay visible to the tests instead of being followed
    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build api client");

    TestApp {
        address,
        admin_panel,
        sentinel,
        api_client,
    }
}

pub struct TestApp {
    pub address: String,
    pub admin_panel: MockServer,
    pub sentinel: SentinelSettings,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{}", &self.address, path))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn post_form(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}{}", &self.address, path))
            .form(body)
            .send()
            .await
            .expect("failed to execute request")
    }
}

pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(303, response.status().as_u16());
    assert_eq!(location, response.headers().get("Location").unwrap());
}

/// An HTML answer from the mock panel, served the way the real panel serves
/// documents.
pub fn html_response(html: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8")
}
