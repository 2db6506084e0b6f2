//! Intercepted requests, their cache keys, and plain HTTP responses.

use bytes::Bytes;
use url::Url;

use crate::cache::hash::compute_request_key;

/// A request handed to the router by its host.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl InterceptedRequest {
    /// A bodiless GET, the shape of every cacheable request.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, headers: Vec::new(), body: Bytes::new() }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Cache identity: method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
    pub hash: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        let url = url.to_string();
        let hash = compute_request_key(method, &url);
        Self { method: method.to_string(), url, hash }
    }
}

/// Status, headers and body of an HTTP response.
///
/// Used both for live network responses and for cached copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Only exact 200 responses are written by the routing strategies.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// 2xx, the precache acceptance rule.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
