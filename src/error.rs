//! Unified error types for studygate with fail-open philosophy.
//!
//! Entitlement bookkeeping must never block a student from working. When the
//! profile store misbehaves we log a warning and keep going with the
//! in-memory counters rather than propagating the failure to the feature.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for studygate operations.
#[derive(Error, Debug)]
pub enum StudyGateError {
    /// I/O errors from profile file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// User id that cannot be used as a profile key.
    #[error("invalid user id: {user_id:?}")]
    InvalidUserId { user_id: String },

    /// Calendar date that is not `YYYY-MM-DD`.
    #[error("invalid date: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    /// Profile not found in storage.
    #[error("profile not found: {user_id}")]
    ProfileNotFound { user_id: String },
}

/// A specialized Result type for studygate operations.
pub type Result<T> = std::result::Result<T, StudyGateError>;

impl StudyGateError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid user id error.
    pub fn invalid_user_id(user_id: impl Into<String>) -> Self {
        Self::InvalidUserId {
            user_id: user_id.into(),
        }
    }

    /// Create an invalid date error.
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }

    /// Create a profile not found error.
    pub fn profile_not_found(user_id: impl Into<String>) -> Self {
        Self::ProfileNotFound {
            user_id: user_id.into(),
        }
    }
}

impl From<io::Error> for StudyGateError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for StudyGateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and carry on with a safe value. Used for every persistence
/// write issued by the reconciler and the debiter.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the studygate CLI.
pub mod exit_codes {
    /// The action is allowed (or the command succeeded).
    pub const ALLOW: i32 = 0;

    /// The command itself failed.
    pub const ERROR: i32 = 1;

    /// The gate denied the action; the paywall should be shown.
    pub const DENY: i32 = 2;

    /// Crash (panic hook).
    pub const CRASH: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StudyGateError::storage(
            "/tmp/alice.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/alice.json"));
    }

    #[test]
    fn test_invalid_user_id_display() {
        let err = StudyGateError::invalid_user_id("../etc");
        assert_eq!(err.to_string(), "invalid user id: \"../etc\"");
    }

    #[test]
    fn test_invalid_date_display() {
        let err = StudyGateError::invalid_date("2024-13-01");
        assert!(err.to_string().contains("2024-13-01"));
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_profile_not_found_display() {
        let err = StudyGateError::profile_not_found("alice");
        assert_eq!(err.to_string(), "profile not found: alice");
    }

    #[test]
    fn test_config_error_display() {
        let err = StudyGateError::config("invalid TOML");
        assert_eq!(err.to_string(), "config error: invalid TOML");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: StudyGateError = io_err.into();
        assert!(matches!(err, StudyGateError::Storage { .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: StudyGateError = json_err.into();
        assert!(matches!(err, StudyGateError::Serde { .. }));
    }

    #[test]
    fn test_fail_open_default() {
        let result: Result<Vec<String>> = Err(StudyGateError::serde("test"));
        let value = result.fail_open_default("test context");
        assert!(value.is_empty());
    }

    #[test]
    fn test_fail_open_with() {
        let result: Result<u32> = Err(StudyGateError::config("test"));
        assert_eq!(result.fail_open_with("test context", 42), 42);
    }

    #[test]
    fn test_fail_open_success() {
        let result: Result<u32> = Ok(100);
        assert_eq!(result.fail_open_default("test context"), 100);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::ALLOW, 0);
        assert_eq!(exit_codes::ERROR, 1);
        assert_eq!(exit_codes::DENY, 2);
        assert_eq!(exit_codes::CRASH, 3);
    }
}
