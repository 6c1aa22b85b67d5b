//! Request and response values flowing through the worker.
//!
//! Bodies are `Bytes`, so cloning a response to store it leaves the caller's
//! copy fully readable.

use bytes::Bytes;
use hearth_core::{CachedResponse, Error};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use url::Url;

/// Body of the synthetic response returned when network and cache are both exhausted.
pub const UNAVAILABLE_BODY: &str = "Offline - content not available";

/// An intercepted page request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a request. The URL fragment is dropped; it never reaches the network.
    pub fn new(method: Method, mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method, url, headers: HeaderMap::new(), body: None }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A top-level page navigation, as issued by the browser.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_header(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        )
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Append headers given as name/value strings.
    pub fn with_header_pairs(mut self, pairs: &[(String, String)]) -> Result<Self, Error> {
        for (name, value) in pairs {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidInput(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidInput(format!("invalid header value for {name}: {e}")))?;
            self.headers.append(name, value);
        }
        Ok(self)
    }

    /// Whether the Accept header asks for an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.contains("text/html"))
    }
}

/// A response delivered to the page.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// The synthetic 503 served when neither network nor cache can answer.
    pub fn unavailable() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        Self::new(StatusCode::SERVICE_UNAVAILABLE, headers, Bytes::from_static(UNAVAILABLE_BODY.as_bytes()))
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Header pairs in order, skipping values that are not valid UTF-8.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        headers_to_pairs(&self.headers)
    }

    /// Snapshot for the cache store.
    pub fn to_cached(&self) -> CachedResponse {
        CachedResponse::new(self.status.as_u16(), self.status_text(), self.header_pairs(), self.body.to_vec())
    }

    /// Rebuild a response from a stored snapshot.
    pub fn from_cached(cached: CachedResponse) -> Result<Self, Error> {
        let status = StatusCode::from_u16(cached.status)
            .map_err(|e| Error::InvalidInput(format!("stored status {}: {e}", cached.status)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &cached.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!(header = %name, "dropping unparseable stored header"),
            }
        }

        Ok(Self { status, headers, body: Bytes::from(cached.body) })
    }
}

pub(crate) fn headers_to_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_drops_fragment() {
        let request = Request::get(Url::parse("https://example.com/blog#latest").unwrap());
        assert_eq!(request.url.as_str(), "https://example.com/blog");
    }

    #[test]
    fn test_navigation_accepts_html() {
        let url = Url::parse("https://example.com/about").unwrap();
        assert!(Request::navigate(url.clone()).accepts_html());
        assert!(!Request::get(url.clone()).accepts_html());

        let json = Request::get(url).with_header(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!json.accepts_html());
    }

    #[test]
    fn test_with_header_pairs_rejects_bad_name() {
        let request = Request::get(Url::parse("https://example.com/").unwrap());
        let result = request.with_header_pairs(&[("bad header".to_string(), "x".to_string())]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_unavailable_shape() {
        let response = Response::unavailable();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status_text(), "Service Unavailable");
        assert_eq!(response.text(), UNAVAILABLE_BODY);
        assert_eq!(response.headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_cached_conversion_preserves_fields() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/css"));
        let response = Response::new(StatusCode::OK, headers, "body{}");

        let cached = response.to_cached();
        assert_eq!(cached.status, 200);
        assert_eq!(cached.status_text, "OK");

        let restored = Response::from_cached(cached).unwrap();
        assert_eq!(restored.status, StatusCode::OK);
        assert_eq!(restored.headers.get(header::CONTENT_TYPE).unwrap(), "text/css");
        assert_eq!(restored.text(), "body{}");
    }
}
