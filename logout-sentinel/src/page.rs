use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("invalid title pattern"));
static BODY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").expect("invalid body pattern"));
static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("invalid script pattern")
});
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("invalid style pattern"));
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("invalid tag pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("invalid space pattern"));

/// The two signals the blank-page heuristic reads from a rendered document:
/// the raw `<title>` content and the text a user would actually see.
#[derive(Clone, Debug)]
pub struct PageSignals {
    title: String,
    visible_text: String,
}

impl PageSignals {
    pub fn from_html(html: &str) -> Self {
        let title = TITLE_TAG
            .captures(html)
            .map(|captures| captures[1].to_string())
            .unwrap_or_default();

        // Fall back to the whole document when no <body> is present; a page
        // that malformed is inspected as-is rather than skipped.
        let body = BODY_TAG
            .captures(html)
            .map(|captures| captures[1].to_string())
            .unwrap_or_else(|| html.to_string());

        let without_scripts = SCRIPT_BLOCK.replace_all(&body, " ");
        let without_styles = STYLE_BLOCK.replace_all(&without_scripts, " ");
        let without_markup = MARKUP.replace_all(&without_styles, " ");
        let decoded = decode_entities(&without_markup);
        let visible_text = WHITESPACE.replace_all(decoded.trim(), " ").to_string();

        Self {
            title,
            visible_text,
        }
    }

    /// Raw title content: an absent `<title>` yields the empty string, while
    /// a whitespace-only one is kept as-is and counts as non-empty.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn visible_text(&self) -> &str {
        &self.visible_text
    }

    pub fn visible_grapheme_count(&self) -> usize {
        self.visible_text.graphemes(true).count()
    }
}

/// Decodes the handful of entities common in server-rendered admin markup.
/// `&nbsp;` becomes plain whitespace so runs of it never count as content;
/// `&amp;` is decoded last to avoid double-decoding.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
