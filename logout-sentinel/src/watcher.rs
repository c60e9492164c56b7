use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Tracks the most recently observed navigation path. One instance lives in
/// application state for the lifetime of the process; every proxied request
/// is an observed navigation.
pub struct NavigationWatcher {
    last_navigation: Mutex<Option<Navigation>>,
}

struct Navigation {
    path: String,
    observed_at: DateTime<Utc>,
}

impl NavigationWatcher {
    pub fn new() -> Self {
        Self {
            last_navigation: Mutex::new(None),
        }
    }

    /// Records `path` as the latest navigation. Returns whether it differs
    /// from the previously recorded one.
    pub fn observe(&self, path: &str) -> bool {
        let mut last = self
            .last_navigation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let changed = !matches!(last.as_ref(), Some(previous) if previous.path == path);
        if changed {
            match last.as_ref() {
                Some(previous) => {
                    tracing::debug!(
                        previous = %previous.path,
                        current = %path,
                        "Observed navigation changed"
                    );
                }
                None => tracing::debug!(current = %path, "First navigation observed"),
            }
            *last = Some(Navigation {
                path: path.to_string(),
                observed_at: Utc::now(),
            });
        }
        changed
    }

    pub fn last_navigation(&self) -> Option<(String, DateTime<Utc>)> {
        self.last_navigation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|navigation| (navigation.path.clone(), navigation.observed_at))
    }
}

impl Default for NavigationWatcher {
    fn default() -> Self {
        Self::new()
    }
}
