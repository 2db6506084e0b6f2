//! Version-qualified store names.

use std::fmt;

/// The three store names owned by one cache version.
///
/// Derived from the version tag alone; two routers with the same tag
/// share stores, a new tag makes every older store stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    pub static_store: String,
    pub dynamic_store: String,
    pub runtime_store: String,
}

impl StoreNames {
    pub fn for_version(version: &str) -> Self {
        Self {
            static_store: format!("static-{version}"),
            dynamic_store: format!("dynamic-{version}"),
            runtime_store: format!("runtime-{version}"),
        }
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.static_store, &self.dynamic_store, &self.runtime_store]
    }

    /// True if `name` belongs to this version.
    pub fn is_current(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

impl fmt::Display for StoreNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.static_store, self.dynamic_store, self.runtime_store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_from_version() {
        let names = StoreNames::for_version("v1.0.2");
        assert_eq!(names.static_store, "static-v1.0.2");
        assert_eq!(names.dynamic_store, "dynamic-v1.0.2");
        assert_eq!(names.runtime_store, "runtime-v1.0.2");
    }

    #[test]
    fn test_display_lists_all_stores() {
        let names = StoreNames::for_version("v1.0.2");
        assert_eq!(names.to_string(), "static-v1.0.2, dynamic-v1.0.2, runtime-v1.0.2");
    }

    #[test]
    fn test_is_current() {
        let names = StoreNames::for_version("v2");
        assert!(names.is_current("runtime-v2"));
        assert!(!names.is_current("static-v1"));
        assert!(!names.is_current("static-v2-old"));
    }
}
