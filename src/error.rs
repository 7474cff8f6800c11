//! Error types for the framecache library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (debug-only `check_invariants` methods).
//! - [`ConfigError`]: Returned when cache node options are invalid
//!   (negative size override, zero worker threads).
//!
//! ## Example Usage
//!
//! ```
//! use framecache::error::ConfigError;
//! use framecache::manager::CacheOptions;
//!
//! let ok: Result<(), ConfigError> = CacheOptions::new().size(40).validate();
//! assert!(ok.is_ok());
//!
//! let bad = CacheOptions::new().size(-1).validate();
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by debug-only `check_invariants` methods
/// (e.g. [`AdaptiveCache::check_invariants`](crate::policy::adaptive::AdaptiveCache::check_invariants)).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
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

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache node parameters are invalid.
///
/// Produced by [`CacheOptions::validate`](crate::manager::CacheOptions::validate)
/// and the fallible `try_*` constructors. Carries a human-readable
/// description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use framecache::scheduler::SchedulerConfig;
///
/// let err = SchedulerConfig::try_new(false, 0).unwrap_err();
/// assert!(err.to_string().contains("worker"));
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
