//! Error types for the slotcache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. a capacity too small to hold the retire/install window).
//!
//! ## Example Usage
//!
//! ```
//! use slotcache::engine::Cache;
//! use slotcache::error::ConfigError;
//! use slotcache::policy::EvictionPolicy;
//!
//! // Fallible constructor for user-configurable parameters
//! let cache: Result<Cache<String, i32>, ConfigError> =
//!     Cache::new(100, EvictionPolicy::Lru);
//! assert!(cache.is_ok());
//!
//! // A degenerate capacity is caught without panicking
//! let bad = Cache::<String, i32>::new(1, EvictionPolicy::Lru);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`Cache::new`](crate::engine::Cache::new) and
/// [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
/// Carries a human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use slotcache::engine::Cache;
/// use slotcache::policy::EvictionPolicy;
///
/// let err = Cache::<u64, u64>::new(0, EvictionPolicy::Fifo).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be > 1");
        assert_eq!(err.to_string(), "capacity must be > 1");
    }

    #[test]
    fn config_debug_includes_message() {
        let err = ConfigError::new("bad batch size");
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("bad batch size"));
    }

    #[test]
    fn config_message_accessor() {
        let err = ConfigError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }
}
