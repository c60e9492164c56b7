use crate::configuration::SentinelSettings;
use crate::page::PageSignals;

/// A problem found in a rendered navigation outcome.
///
/// Callers pass `document` only for outcomes that actually rendered
/// something; redirects are leaving the URL and are never classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Detection {
    /// Near-empty visible content and no title: the panel's broken logout
    /// left the user staring at nothing.
    BlankPage { visible_graphemes: usize },
    /// The navigation is still parked on the logout URL even though the
    /// panel answered with a page.
    StaleLogoutUrl,
}

/// Runs both heuristics against one observed navigation. The content check
/// wins over the URL check, mirroring the order the panel's in-page fix
/// applied them in.
pub fn classify(
    path: &str,
    document: Option<&PageSignals>,
    policy: &SentinelSettings,
) -> Option<Detection> {
    if let Some(document) = document {
        let visible_graphemes = document.visible_grapheme_count();
        if visible_graphemes < policy.blank_text_threshold && document.title().is_empty() {
            return Some(Detection::BlankPage { visible_graphemes });
        }
    }

    if policy.is_stale_logout_path(path) {
        return Some(Detection::StaleLogoutUrl);
    }

    None
}
