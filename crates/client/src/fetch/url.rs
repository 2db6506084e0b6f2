//! Resolving root-relative request targets against the application origin.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty path")]
    Empty,

    #[error("path must be root-relative: {0}")]
    NotRootRelative(String),

    #[error("path escapes origin: {0}")]
    CrossOrigin(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a root-relative path (with optional query) against `origin`.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require a leading `/` but reject `//host` network paths
/// 3. Join onto the origin, keeping the query string intact
/// 4. Remove fragment (#...)
pub fn resolve(origin: &url::Url, path_and_query: &str) -> Result<url::Url, UrlError> {
    let trimmed = path_and_query.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    if !trimmed.starts_with('/') {
        return Err(UrlError::NotRootRelative(trimmed.to_string()));
    }

    let mut resolved = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if resolved.origin() != origin.origin() {
        return Err(UrlError::CrossOrigin(trimmed.to_string()));
    }

    resolved.set_fragment(None);

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("https://vet.example/").unwrap()
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve(&origin(), "/").unwrap();
        assert_eq!(url.as_str(), "https://vet.example/");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&origin(), "/reports?branch=7&day=2").unwrap();
        assert_eq!(url.path(), "/reports");
        assert_eq!(url.query(), Some("branch=7&day=2"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/profile#settings").unwrap();
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /manifest.json ").unwrap();
        assert_eq!(url.as_str(), "https://vet.example/manifest.json");
    }

    #[test]
    fn test_resolve_ignores_origin_path() {
        let origin = url::Url::parse("https://vet.example/app/").unwrap();
        let url = resolve(&origin, "/Logo.png").unwrap();
        assert_eq!(url.as_str(), "https://vet.example/Logo.png");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), "  "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_relative_rejected() {
        assert!(matches!(resolve(&origin(), "manifest.json"), Err(UrlError::NotRootRelative(_))));
    }

    #[test]
    fn test_resolve_network_path_rejected() {
        assert!(matches!(resolve(&origin(), "//evil.example/x"), Err(UrlError::CrossOrigin(_))));
    }
}
