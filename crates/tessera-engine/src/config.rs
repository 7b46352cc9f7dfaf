//! Database configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tessera_core::LockPolicy;
use tessera_core::index::DictionaryIndex;
use tessera_core::path::ShortestPathRequest;

/// Errors from [`Config::validate()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The lock policy allows no acquisition attempt.
    ZeroLockAttempts,
    /// The lock policy gives each attempt no time to wait.
    ZeroLockTimeout,
    /// Path searches would be cut before their first step.
    ZeroFrontierLimit,
    /// No index type name was given for default indices.
    EmptyDefaultIndexType,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLockAttempts => write!(f, "lock_policy.max_attempts must be greater than zero"),
            Self::ZeroLockTimeout => {
                write!(f, "lock_policy.attempt_timeout must be greater than zero")
            }
            Self::ZeroFrontierLimit => write!(f, "path_frontier_limit must be greater than zero"),
            Self::EmptyDefaultIndexType => write!(f, "default_index_type must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Retry budget for every gate the database creates: the store, the
    /// index factory and each index.
    pub lock_policy: LockPolicy,

    /// Index type used by [`TesseraDB::create_default_index`](crate::TesseraDB::create_default_index).
    pub default_index_type: String,

    /// Partial paths kept per search side when a request sets no limit of
    /// its own.
    pub path_frontier_limit: usize,

    /// Snapshot file used by [`TesseraDB::flush`](crate::TesseraDB::flush).
    /// `None` keeps the database purely in memory.
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_policy: LockPolicy::default(),
            default_index_type: DictionaryIndex::TYPE_NAME.to_string(),
            path_frontier_limit: ShortestPathRequest::DEFAULT_FRONTIER_LIMIT,
            path: None,
        }
    }
}

impl Config {
    /// Creates a configuration for an in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a configuration backed by a snapshot file at `path`.
    #[must_use]
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Sets the gate retry budget.
    #[must_use]
    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    /// Sets how many times each gate acquisition is attempted.
    #[must_use]
    pub fn with_lock_attempts(mut self, attempts: u32) -> Self {
        self.lock_policy = self.lock_policy.with_max_attempts(attempts);
        self
    }

    /// Sets how long each gate acquisition attempt may wait.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_policy = self.lock_policy.with_attempt_timeout(timeout);
        self
    }

    /// Sets the index type for default indices.
    #[must_use]
    pub fn with_default_index_type(mut self, type_name: impl Into<String>) -> Self {
        self.default_index_type = type_name.into();
        self
    }

    /// Sets the default path frontier limit.
    #[must_use]
    pub fn with_path_frontier_limit(mut self, limit: usize) -> Self {
        self.path_frontier_limit = limit;
        self
    }

    /// Sets the snapshot file.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Validates the configuration.
    ///
    /// Called automatically by [`TesseraDB::with_config()`](crate::TesseraDB::with_config).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any setting is invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.lock_policy.max_attempts == 0 {
            return Err(ConfigError::ZeroLockAttempts);
        }

        if self.lock_policy.attempt_timeout.is_zero() {
            return Err(ConfigError::ZeroLockTimeout);
        }

        if self.path_frontier_limit == 0 {
            return Err(ConfigError::ZeroFrontierLimit);
        }

        if self.default_index_type.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultIndexType);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.lock_policy, LockPolicy::default());
        assert_eq!(config.default_index_type, "DictionaryIndex");
        assert_eq!(config.path_frontier_limit, ShortestPathRequest::DEFAULT_FRONTIER_LIMIT);
        assert!(config.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_persistent() {
        let config = Config::persistent("/tmp/graph.tess");
        assert_eq!(config.path, Some(PathBuf::from("/tmp/graph.tess")));
    }

    #[test]
    fn test_config_builders() {
        let config = Config::in_memory()
            .with_lock_attempts(3)
            .with_lock_timeout(Duration::from_millis(2))
            .with_default_index_type("RangeIndex")
            .with_path_frontier_limit(64)
            .with_path("snap.bin");

        assert_eq!(config.lock_policy, LockPolicy::new(3, Duration::from_millis(2)));
        assert_eq!(config.default_index_type, "RangeIndex");
        assert_eq!(config.path_frontier_limit, 64);
        assert_eq!(config.path, Some(PathBuf::from("snap.bin")));
    }

    #[test]
    fn test_validate_rejects() {
        assert_eq!(
            Config::default().with_lock_attempts(0).validate(),
            Err(ConfigError::ZeroLockAttempts)
        );
        assert_eq!(
            Config::default().with_lock_timeout(Duration::ZERO).validate(),
            Err(ConfigError::ZeroLockTimeout)
        );
        assert_eq!(
            Config::default().with_path_frontier_limit(0).validate(),
            Err(ConfigError::ZeroFrontierLimit)
        );
        assert_eq!(
            Config::default().with_default_index_type("  ").validate(),
            Err(ConfigError::EmptyDefaultIndexType)
        );
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::ZeroFrontierLimit.to_string(),
            "path_frontier_limit must be greater than zero"
        );
    }
}
