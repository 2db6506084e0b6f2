//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (VET_SW_*)
//! 2. TOML config file (if VET_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::StoreNames;
use crate::route::RouteRules;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (VET_SW_*)
/// 2. TOML config file (if VET_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cache version tag. Qualifies every store name; bumping it makes
    /// all older stores stale at the next activation.
    ///
    /// Set via VET_SW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to SQLite cache database.
    ///
    /// Set via VET_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Application origin the proxy forwards to.
    ///
    /// Set via VET_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: Url,

    /// Address the proxy listens on.
    ///
    /// Set via VET_SW_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// User-Agent for requests that do not carry their own.
    ///
    /// Set via VET_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body bytes accepted from the network.
    ///
    /// Set via VET_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Optional upstream request timeout in milliseconds. Unset means no timeout.
    ///
    /// Set via VET_SW_TIMEOUT_MS environment variable.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Path prefix of requests that are never intercepted.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// URL schemes that are never intercepted.
    #[serde(default = "default_extension_schemes")]
    pub extension_schemes: Vec<String>,

    /// Path segment marking static build output.
    #[serde(default = "default_static_marker")]
    pub static_marker: String,

    /// Path segment marking compiled chunk bundles.
    #[serde(default = "default_chunk_marker")]
    pub chunk_marker: String,

    /// File extensions served cache-first.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Root-relative paths precached at install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Activate right after install instead of waiting for SKIP_WAITING.
    ///
    /// Set via VET_SW_SKIP_WAITING_ON_INSTALL environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// Check the chunk marker before the static rules, making chunks network-only.
    ///
    /// Set via VET_SW_CHUNKS_NETWORK_ONLY environment variable.
    #[serde(default)]
    pub chunks_network_only: bool,
}

fn default_cache_version() -> String {
    "v1.0.2".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./vet-sw-cache.sqlite")
}

fn default_origin() -> Url {
    Url::parse("http://127.0.0.1:3000/").expect("static origin parses")
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_user_agent() -> String {
    "vet-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_api_prefix() -> String {
    RouteRules::default().api_prefix
}

fn default_extension_schemes() -> Vec<String> {
    RouteRules::default().extension_schemes
}

fn default_static_marker() -> String {
    RouteRules::default().static_marker
}

fn default_chunk_marker() -> String {
    RouteRules::default().chunk_marker
}

fn default_static_extensions() -> Vec<String> {
    RouteRules::default().static_extensions
}

fn default_precache() -> Vec<String> {
    ["/", "/manifest.json", "/Logo.png", "/icon-192.png", "/icon-512.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            origin: default_origin(),
            listen_addr: default_listen_addr(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: None,
            api_prefix: default_api_prefix(),
            extension_schemes: default_extension_schemes(),
            static_marker: default_static_marker(),
            chunk_marker: default_chunk_marker(),
            static_extensions: default_static_extensions(),
            precache: default_precache(),
            skip_waiting_on_install: true,
            chunks_network_only: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Store names for the configured version.
    pub fn store_names(&self) -> StoreNames {
        StoreNames::for_version(&self.cache_version)
    }

    /// Classification rules taken from this configuration.
    pub fn route_rules(&self) -> RouteRules {
        RouteRules {
            api_prefix: self.api_prefix.clone(),
            extension_schemes: self.extension_schemes.clone(),
            static_marker: self.static_marker.clone(),
            chunk_marker: self.chunk_marker.clone(),
            static_extensions: self.static_extensions.clone(),
            chunks_network_only: self.chunks_network_only,
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `VET_SW_`
    /// 2. TOML file from `VET_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("VET_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("VET_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::extract(figment)
    }

    /// Extract and validate a configuration from an assembled figment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadFailed` on extraction errors and
    /// `ConfigError::Invalid` when validation rejects a value.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
