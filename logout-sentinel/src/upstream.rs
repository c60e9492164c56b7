use axum::body::Bytes;
use axum::response::IntoResponse;
use http::header::{
    HeaderMap, HeaderName, ACCEPT, ACCEPT_ENCODING, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE,
    HOST, LOCATION, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING,
    UPGRADE,
};
use http::{Method, StatusCode};
use reqwest::Client;

/// HTTP client for the admin panel the sentinel fronts.
///
/// Redirects are never followed: the sentinel inspects each hop of a
/// navigation, so an upstream `Location` must reach the pipeline untouched.
pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: String, timeout: std::time::Duration) -> Self {
        let http_client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .expect("failed to build the upstream HTTP client");
        Self {
            http_client,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forwards a proxied navigation to the panel and buffers the answer.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        mut headers: HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, reqwest::Error> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path_and_query);
        strip_unforwardable_headers(&mut headers);

        let response = self
            .http_client
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        UpstreamResponse::read(response).await
    }

    /// Fetches a single page, for the probe and the startup sweep.
    pub async fn fetch_page(&self, path: &str) -> Result<UpstreamResponse, reqwest::Error> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "text/html")
            .send()
            .await?;

        UpstreamResponse::read(response).await
    }
}

/// A fully buffered upstream answer.
#[derive(Debug)]
pub struct UpstreamResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl UpstreamResponse {
    async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let mut headers = response.headers().clone();
        // Framing is recomputed when the response is re-serialized.
        strip_framing_headers(&mut headers);
        let body = response.bytes().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    pub fn is_html(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Swaps the body out, e.g. for a rewritten document.
    pub fn with_body(mut self, body: String) -> Self {
        self.body = Bytes::from(body);
        self
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Hop-by-hop headers plus the ones the sentinel manages itself: `host` is
/// derived from the upstream URL and `accept-encoding` is dropped so
/// documents arrive uncompressed and inspectable.
fn strip_unforwardable_headers(headers: &mut HeaderMap) {
    for header in [
        HOST,
        CONTENT_LENGTH,
        ACCEPT_ENCODING,
        CONNECTION,
        PROXY_AUTHENTICATE,
        PROXY_AUTHORIZATION,
        TE,
        TRAILER,
        TRANSFER_ENCODING,
        UPGRADE,
    ] {
        headers.remove(header);
    }
    headers.remove(HeaderName::from_static("keep-alive"));
}

fn strip_framing_headers(headers: &mut HeaderMap) {
    for header in [CONNECTION, CONTENT_LENGTH, TRAILER, TRANSFER_ENCODING, UPGRADE] {
        headers.remove(header);
    }
    headers.remove(HeaderName::from_static("keep-alive"));
}
