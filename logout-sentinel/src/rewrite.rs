use regex::Regex;

use crate::configuration::SentinelSettings;

/// Marker attribute stamped on armed controls. Its presence is what makes
/// re-rewriting idempotent: a control carrying it is never touched again.
pub const LOGOUT_CONTROL_MARKER: &str = "data-logout-sentinel";

const ARMED_ATTRIBUTE: &str = " data-logout-sentinel=\"armed\"";
const SHIM_ID: &str = "logout-sentinel-shim";

/// Rewrites proxied admin HTML: logout-looking controls get the marker
/// attribute, and a small client shim is injected before `</head>`.
///
/// The control conventions come from the admin UI contract: an `a` whose
/// `href`, a `button` whose `name`, or an `input` whose `value` contains the
/// configured marker substring is a logout control.
pub struct HtmlRewriter {
    control_tag: Regex,
    href_with_marker: Regex,
    name_with_marker: Regex,
    value_with_marker: Regex,
    head_close: Regex,
    shim: Option<String>,
}

/// Outcome of one rewriting pass, with counts for the decision log.
pub struct RewrittenPage {
    pub html: String,
    pub armed_controls: usize,
    pub shim_injected: bool,
}

impl HtmlRewriter {
    pub fn new(policy: &SentinelSettings) -> Result<Self, regex::Error> {
        let marker = regex::escape(&policy.logout_marker);
        Ok(Self {
            control_tag: Regex::new(r"(?i)<(a|button|input)\b[^>]*>")?,
            href_with_marker: attribute_pattern("href", &marker)?,
            name_with_marker: attribute_pattern("name", &marker)?,
            value_with_marker: attribute_pattern("value", &marker)?,
            head_close: Regex::new(r"(?i)</head\s*>")?,
            shim: policy.inject_shim.then(|| build_shim(policy)),
        })
    }

    /// One rewriting pass over a proxied document. Arms every unarmed logout
    /// control and injects the shim once, if the document has a `</head>`.
    /// A document without one is marked but left unscripted.
    pub fn arm_logout_controls(&self, html: &str) -> RewrittenPage {
        let mut armed_controls = 0;
        let mut html = self
            .control_tag
            .replace_all(html, |captures: &regex::Captures| {
                let tag = &captures[0];
                if tag.contains(LOGOUT_CONTROL_MARKER) {
                    return tag.to_string();
                }
                let attribute = match captures[1].to_ascii_lowercase().as_str() {
                    "a" => &self.href_with_marker,
                    "button" => &self.name_with_marker,
                    _ => &self.value_with_marker,
                };
                if attribute.is_match(tag) {
                    armed_controls += 1;
                    arm_tag(tag)
                } else {
                    tag.to_string()
                }
            })
            .into_owned();

        let mut shim_injected = false;
        if let Some(shim) = &self.shim {
            if !html.contains(SHIM_ID) {
                if let Some(head_close) = self.head_close.find(&html).map(|m| m.start()) {
                    html.insert_str(head_close, "\n");
                    html.insert_str(head_close, shim);
                    shim_injected = true;
                }
            }
        }

        RewrittenPage {
            html,
            armed_controls,
            shim_injected,
        }
    }
}

fn attribute_pattern(attribute: &str, marker: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#"(?i)\b{0}\s*=\s*("[^"]*{1}[^"]*"|'[^']*{1}[^']*')"#,
        attribute, marker
    ))
}

fn arm_tag(tag: &str) -> String {
    let insert_at = if tag.ends_with("/>") {
        tag.len() - 2
    } else {
        tag.len() - 1
    };
    let mut armed = String::with_capacity(tag.len() + ARMED_ATTRIBUTE.len());
    armed.push_str(&tag[..insert_at]);
    armed.push_str(ARMED_ATTRIBUTE);
    armed.push_str(&tag[insert_at..]);
    armed
}

/// The client-side leg of the logout fallback: a delegated click listener on
/// armed controls that, after the grace delay, clears browser storage and
/// forces the login page if the browser is still inside the admin section.
/// One listener on the document, so repeated page delivery never stacks
/// handlers.
fn build_shim(policy: &SentinelSettings) -> String {
    format!(
        r#"<script id="logout-sentinel-shim">
(function () {{
    document.addEventListener('click', function (event) {{
        if (!event.target.closest('[{marker}]')) {{
            return;
        }}
        setTimeout(function () {{
            var path = window.location.pathname;
            if (path.indexOf('{admin_prefix}') === 0 && path.indexOf('{login_segment}') === -1) {{
                console.log('Logout sentinel: logout did not leave the admin section, forcing login redirect');
                if (typeof (Storage) !== 'undefined') {{
                    localStorage.clear();
                    sessionStorage.clear();
                }}
                window.location.href = '{login_path}';
            }}
        }}, {grace_ms});
    }});
}})();
</script>"#,
        marker = LOGOUT_CONTROL_MARKER,
        admin_prefix = policy.admin_prefix,
        login_segment = policy.login_segment,
        login_path = policy.login_path,
        grace_ms = policy.click_grace_ms,
    )
}
