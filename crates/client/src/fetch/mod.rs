//! Network access for the cache router.
//!
//! ### Fetcher
//! The router only talks to the network through [`Fetcher`], so hosts and
//! tests can substitute their own transport.
//!
//! ### FetchClient
//! - reqwest with rustls and transparent gzip/brotli/deflate decoding
//! - Hop-by-hop headers and `accept-encoding` are not forwarded
//! - Redirects are returned to the caller, not followed
//! - Max body bytes: 10MB (configurable)
//! - Optional request timeout; none by default

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};

pub use self::url::{UrlError, resolve};

use vet_sw_core::config::AppConfig;
use vet_sw_core::{Error, HttpResponse, InterceptedRequest};

/// Headers that describe one connection hop and are never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// True for headers a proxy must not copy between hops.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Performs network requests on behalf of the router.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Send `request` and return whatever the network answered.
    ///
    /// Any HTTP status is a successful fetch. Errors mean no response arrived.
    async fn fetch(&self, request: &InterceptedRequest) -> Result<HttpResponse, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "vet-sw/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "vet-sw/0.1".to_string(), max_bytes: 10 * 1024 * 1024, timeout: None }
    }
}

impl FetchConfig {
    /// Same settings with no body size limit, for traffic that is never cached.
    pub fn without_size_limit(self) -> Self {
        Self { max_bytes: usize::MAX, ..self }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), max_bytes: config.max_bytes, timeout: config.timeout() }
    }
}

/// reqwest-backed [`Fetcher`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

fn network_error(err: reqwest::Error) -> Error {
    if err.is_timeout() { Error::FetchTimeout(err.to_string()) } else { Error::Network(err.to_string()) }
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::InvalidInput(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn forward_headers(request: &InterceptedRequest) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            if is_hop_by_hop(name) || name.eq_ignore_ascii_case(header::ACCEPT_ENCODING.as_str()) {
                continue;
            }
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!(header = %name, "dropping unforwardable request header"),
            }
        }
        headers
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<HttpResponse, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self
            .http
            .request(method, request.url.clone())
            .headers(Self::forward_headers(request));
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response.bytes().await.map_err(network_error)?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            bytes = bytes.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(HttpResponse { status: status.as_u16(), headers, body: bytes })
    }
}
