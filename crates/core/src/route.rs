//! Request classification.
//!
//! Rules are evaluated in order:
//! 1. non-GET requests are not intercepted
//! 2. paths under the API prefix are not intercepted
//! 3. browser-extension schemes are not intercepted
//! 4. static marker or static extension -> cache-first,
//!    then chunk marker -> network-only, else network-first
//!
//! With the default markers the chunk marker sits under the static marker,
//! so compiled chunks match step 4's cache-first rule and the network-only
//! rule never fires. `RouteRules::chunks_network_only` moves the chunk check
//! ahead of the static check; it is off unless configured.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Serving strategy for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    NetworkOnly,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::NetworkOnly => "network-only",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request was left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    NonGet,
    Api,
    ExtensionScheme,
    /// The router is not active yet (or any more).
    Inactive,
}

impl BypassReason {
    pub fn as_str(self) -> &'static str {
        match self {
            BypassReason::NonGet => "non-get",
            BypassReason::Api => "api",
            BypassReason::ExtensionScheme => "extension-scheme",
            BypassReason::Inactive => "inactive",
        }
    }
}

/// Outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Bypass(BypassReason),
    Handle(Strategy),
}

/// Inputs to the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRules {
    pub api_prefix: String,
    pub extension_schemes: Vec<String>,
    pub static_marker: String,
    pub chunk_marker: String,
    pub static_extensions: Vec<String>,
    pub chunks_network_only: bool,
}

impl Default for RouteRules {
    fn default() -> Self {
        Self {
            api_prefix: "/api/".into(),
            extension_schemes: vec!["chrome-extension".into(), "moz-extension".into()],
            static_marker: "/_next/static/".into(),
            chunk_marker: "/_next/static/chunks/".into(),
            static_extensions: ["css", "js", "png", "jpg", "jpeg", "svg", "webp", "woff", "woff2"]
                .into_iter()
                .map(String::from)
                .collect(),
            chunks_network_only: false,
        }
    }
}

/// Compiled classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RouteRules,
    static_ext: Option<Regex>,
}

impl Classifier {
    /// Compile the rules.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the extension pattern fails to compile.
    pub fn new(rules: RouteRules) -> Result<Self, Error> {
        let static_ext = if rules.static_extensions.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = rules.static_extensions.iter().map(|e| regex::escape(e)).collect();
            let pattern = format!(r"\.({})$", alternatives.join("|"));
            Some(Regex::new(&pattern).map_err(|e| Error::InvalidInput(format!("static_extensions: {e}")))?)
        };

        Ok(Self { rules, static_ext })
    }

    pub fn rules(&self) -> &RouteRules {
        &self.rules
    }

    pub fn classify(&self, method: &str, url: &Url) -> Route {
        if method != "GET" {
            return Route::Bypass(BypassReason::NonGet);
        }

        let path = url.path();
        if path.starts_with(&self.rules.api_prefix) {
            return Route::Bypass(BypassReason::Api);
        }

        if self.rules.extension_schemes.iter().any(|s| s == url.scheme()) {
            return Route::Bypass(BypassReason::ExtensionScheme);
        }

        Route::Handle(self.strategy_for_path(path))
    }

    fn strategy_for_path(&self, path: &str) -> Strategy {
        if self.rules.chunks_network_only && self.is_chunk(path) {
            return Strategy::NetworkOnly;
        }

        if path.contains(&self.rules.static_marker) || self.static_ext.as_ref().is_some_and(|re| re.is_match(path)) {
            return Strategy::CacheFirst;
        }

        if self.is_chunk(path) {
            return Strategy::NetworkOnly;
        }

        Strategy::NetworkFirst
    }

    fn is_chunk(&self, path: &str) -> bool {
        !self.rules.chunk_marker.is_empty() && path.contains(&self.rules.chunk_marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(method: &str, url: &str) -> Route {
        Classifier::new(RouteRules::default())
            .unwrap()
            .classify(method, &Url::parse(url).unwrap())
    }

    #[test]
    fn test_non_get_bypassed() {
        for method in ["POST", "PUT", "DELETE", "HEAD", "get"] {
            assert_eq!(classify(method, "https://vet.example/logo.png"), Route::Bypass(BypassReason::NonGet));
        }
    }

    #[test]
    fn test_api_bypassed() {
        assert_eq!(classify("GET", "https://vet.example/api/reports"), Route::Bypass(BypassReason::Api));
        assert_eq!(classify("GET", "https://vet.example/api/logo.png"), Route::Bypass(BypassReason::Api));
    }

    #[test]
    fn test_api_prefix_needs_trailing_slash() {
        assert_eq!(classify("GET", "https://vet.example/api"), Route::Handle(Strategy::NetworkFirst));
        assert_eq!(classify("GET", "https://vet.example/apis/x"), Route::Handle(Strategy::NetworkFirst));
    }

    #[test]
    fn test_extension_scheme_bypassed() {
        assert_eq!(
            classify("GET", "chrome-extension://abcdef/popup.js"),
            Route::Bypass(BypassReason::ExtensionScheme)
        );
        assert_eq!(classify("GET", "moz-extension://abcdef/icon.png"), Route::Bypass(BypassReason::ExtensionScheme));
    }

    #[test]
    fn test_static_assets_cache_first() {
        for url in [
            "https://vet.example/_next/static/css/app.css",
            "https://vet.example/_next/static/media/font",
            "https://vet.example/logo.png",
            "https://vet.example/fonts/inter.woff2",
            "https://vet.example/img/photo.jpeg",
        ] {
            assert_eq!(classify("GET", url), Route::Handle(Strategy::CacheFirst), "{url}");
        }
    }

    #[test]
    fn test_chunks_are_cache_first_by_default() {
        assert_eq!(
            classify("GET", "https://vet.example/_next/static/chunks/main.abcd.js"),
            Route::Handle(Strategy::CacheFirst)
        );
    }

    #[test]
    fn test_chunks_network_only_when_enabled() {
        let rules = RouteRules { chunks_network_only: true, ..Default::default() };
        let classifier = Classifier::new(rules).unwrap();
        let chunk = Url::parse("https://vet.example/_next/static/chunks/main.abcd.js").unwrap();
        let css = Url::parse("https://vet.example/_next/static/css/app.css").unwrap();

        assert_eq!(classifier.classify("GET", &chunk), Route::Handle(Strategy::NetworkOnly));
        assert_eq!(classifier.classify("GET", &css), Route::Handle(Strategy::CacheFirst));
    }

    #[test]
    fn test_chunk_marker_outside_static_marker_is_network_only() {
        let rules = RouteRules { chunk_marker: "/chunks/".into(), ..Default::default() };
        let classifier = Classifier::new(rules).unwrap();
        let url = Url::parse("https://vet.example/chunks/loader").unwrap();
        assert_eq!(classifier.classify("GET", &url), Route::Handle(Strategy::NetworkOnly));
    }

    #[test]
    fn test_extension_match_is_anchored_and_case_sensitive() {
        assert_eq!(classify("GET", "https://vet.example/logo.png.html"), Route::Handle(Strategy::NetworkFirst));
        assert_eq!(classify("GET", "https://vet.example/LOGO.PNG"), Route::Handle(Strategy::NetworkFirst));
        assert_eq!(classify("GET", "https://vet.example/scss"), Route::Handle(Strategy::NetworkFirst));
    }

    #[test]
    fn test_query_does_not_affect_extension() {
        assert_eq!(classify("GET", "https://vet.example/app.js?v=3"), Route::Handle(Strategy::CacheFirst));
    }

    #[test]
    fn test_pages_network_first() {
        for url in ["https://vet.example/", "https://vet.example/profile", "https://vet.example/manifest.json"] {
            assert_eq!(classify("GET", url), Route::Handle(Strategy::NetworkFirst), "{url}");
        }
    }

    #[test]
    fn test_no_extensions_configured() {
        let rules = RouteRules { static_extensions: Vec::new(), ..Default::default() };
        let classifier = Classifier::new(rules).unwrap();
        let url = Url::parse("https://vet.example/logo.png").unwrap();
        assert_eq!(classifier.classify("GET", &url), Route::Handle(Strategy::NetworkFirst));
    }

    #[test]
    fn test_strategy_serde() {
        assert_eq!(serde_json::to_string(&Strategy::CacheFirst).unwrap(), "\"cache-first\"");
    }
}
