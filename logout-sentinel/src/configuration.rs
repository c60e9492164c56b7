use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::upstream::UpstreamClient;

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    // Grab the execution directory
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    // Set the configuration directory
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    // Generate the name of the environment-specific config file.
    let environment_filename = format!("{}.yml", environment.as_str());

    // Initialize the configuration reader
    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>();
    tracing::debug!("Settings values: {:?}", &settings);

    settings
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub upstream: UpstreamSettings,
    pub sentinel: SentinelSettings,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

/// The admin panel the sentinel sits in front of.
#[derive(Clone, Debug, Deserialize)]
pub struct UpstreamSettings {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl UpstreamSettings {
    pub fn client(self) -> UpstreamClient {
        let timeout = self.timeout();
        UpstreamClient::new(self.base_url, timeout)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Tunables for the logout watchdog. The defaults in `configuration/base.yml`
/// match the constants of the admin panel's original in-page fix, so both
/// layers agree on what counts as a failed logout.
#[derive(Clone, Debug, Deserialize)]
pub struct SentinelSettings {
    /// Where a forced redirect sends the browser.
    pub login_path: String,
    /// Requests outside this prefix pass through uninspected.
    pub admin_prefix: String,
    /// A navigation still parked on this path after the upstream answered is a
    /// failed logout.
    pub logout_path: String,
    /// A landing path containing this segment means the logout worked.
    pub login_segment: String,
    /// Substring identifying logout controls (and logout requests) in the
    /// panel's markup conventions.
    pub logout_marker: String,
    /// Page fetched by the periodic probe and the startup check.
    pub probe_path: String,
    /// A document with fewer visible graphemes than this, and no title, is
    /// classified as a blank page. Heuristic; tune rather than re-derive.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub blank_text_threshold: usize,
    /// Deferral before redirecting away from a stale logout URL, leaving room
    /// for in-flight upstream processing.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub logout_defer_ms: u64,
    /// Grace period granted to the default logout action before the sentinel
    /// overrides a stuck outcome.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub click_grace_ms: u64,
    /// Cadence of the background blank-page probe.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub probe_interval_ms: u64,
    /// Attach the storage-clearing instruction to forced redirects. Only has
    /// effect on secure origins; the redirect itself never depends on it.
    pub clear_storage: bool,
    /// Inject the client shim into proxied admin pages.
    pub inject_shim: bool,
}

impl SentinelSettings {
    /// Paths outside the admin section are forwarded without inspection.
    pub fn is_admin_path(&self, path: &str) -> bool {
        path.starts_with(&self.admin_prefix)
    }

    /// A navigation that looks like it came from a logout control: inside the
    /// admin section and carrying the logout marker in its path.
    pub fn is_logout_request(&self, path: &str) -> bool {
        self.is_admin_path(path) && path.contains(&self.logout_marker)
    }

    pub fn is_stale_logout_path(&self, path: &str) -> bool {
        path.contains(&self.logout_path)
    }

    /// Whether a landing path already reaches the login section, i.e. the
    /// default logout flow worked on its own.
    pub fn lands_on_login(&self, path: &str) -> bool {
        path.contains(&self.login_segment)
    }

    pub fn logout_deferral(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.logout_defer_ms)
    }

    pub fn click_grace(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.click_grace_ms)
    }

    pub fn probe_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.probe_interval_ms)
    }
}

/// The possible runtime environments for this application.
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either 'local' or 'production'",
                other
            )),
        }
    }
}
