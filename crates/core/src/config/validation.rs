//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` is empty or contains whitespace
    /// - `origin` is not an http(s) URL
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `timeout_ms` is set below 100ms or above 5 minutes
    /// - `user_agent` is empty
    /// - `api_prefix` or a `precache` entry is not root-relative
    /// - a static extension is empty or not alphanumeric
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }
        if self.cache_version.chars().any(char::is_whitespace) {
            return Err(invalid("cache_version", "must not contain whitespace"));
        }

        if !matches!(self.origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", self.origin.scheme())));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 100MB"));
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(invalid("timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.api_prefix.starts_with('/') {
            return Err(invalid("api_prefix", "must start with '/'"));
        }

        if let Some(path) = self.precache.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid("precache", format!("'{path}' must start with '/'")));
        }

        if let Some(ext) = self
            .static_extensions
            .iter()
            .find(|e| e.is_empty() || !e.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(invalid("static_extensions", format!("'{ext}' must be a bare alphanumeric extension")));
        }

        if self.static_marker.is_empty() {
            return Err(invalid("static_marker", "must not be empty"));
        }

        if self.chunk_marker.contains(&self.static_marker) && !self.chunks_network_only {
            tracing::warn!(
                static_marker = %self.static_marker,
                chunk_marker = %self.chunk_marker,
                "chunk_marker lies under static_marker; chunks will be served cache-first \
                 unless chunks_network_only is set"
            );
        }

        Ok(())
    }
}
