//! Structured error types for configuration resolution.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // File errors
    PathInvalid,
    DecodeError,

    // Chain errors
    CircularDependency,

    // Merge errors
    UnknownField,
    TypeMismatch,

    // Internal errors
    SerializeError,
}

/// Errors raised while discovering, chaining, decoding or merging config files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A referenced file is missing or cannot be statted.
    #[error("invalid config path {}: {reason}", path.display())]
    PathInvalid { path: PathBuf, reason: String },

    /// An inheritance chain revisits a file.
    #[error("circular dependency detected: {} is already part of the inheritance chain", path.display())]
    CircularDependency { path: PathBuf },

    /// File content could not be parsed.
    #[error("failed to decode {}: {reason}", path.display())]
    DecodeError { path: PathBuf, reason: String },

    /// A (strategy-stripped) key does not name any field.
    #[error("unknown config field '{key}' in {}", path.display())]
    UnknownField { key: String, path: PathBuf },

    /// A value does not fit the declared type of its field.
    #[error("field '{key}' in {} expects {expected}", path.display())]
    TypeMismatch {
        key: String,
        expected: String,
        path: PathBuf,
    },

    /// The document could not be turned into a value tree.
    #[error("failed to serialize configuration: {0}")]
    Serialize(String),
}

impl ConfigError {
    /// The stable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::PathInvalid { .. } => ErrorCode::PathInvalid,
            ConfigError::CircularDependency { .. } => ErrorCode::CircularDependency,
            ConfigError::DecodeError { .. } => ErrorCode::DecodeError,
            ConfigError::UnknownField { .. } => ErrorCode::UnknownField,
            ConfigError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            ConfigError::Serialize(_) => ErrorCode::SerializeError,
        }
    }

    // Convenience constructors

    pub fn path_invalid(path: &Path, reason: impl Into<String>) -> Self {
        ConfigError::PathInvalid {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn circular(path: &Path) -> Self {
        ConfigError::CircularDependency {
            path: path.to_path_buf(),
        }
    }

    pub fn decode(path: &Path, err: impl std::fmt::Display) -> Self {
        ConfigError::DecodeError {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    pub fn unknown_field(key: &str, path: &Path) -> Self {
        ConfigError::UnknownField {
            key: key.to_string(),
            path: path.to_path_buf(),
        }
    }

    pub fn type_mismatch(key: &str, expected: impl std::fmt::Display, path: &Path) -> Self {
        ConfigError::TypeMismatch {
            key: key.to_string(),
            expected: expected.to_string(),
            path: path.to_path_buf(),
        }
    }

    /// Whether resolution may continue past this error.
    ///
    /// Chain-building errors abort the inheritance resolution; everything else
    /// only skips the offending file or operation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ConfigError::CircularDependency { .. } | ConfigError::PathInvalid { .. }
        )
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serialize(err.to_string())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ConfigError::circular(Path::new("/tmp/a.yml"));
        assert_eq!(err.code(), ErrorCode::CircularDependency);
        assert!(!err.is_recoverable());

        let err = ConfigError::unknown_field("nope", Path::new("/tmp/a.yml"));
        assert_eq!(err.code(), ErrorCode::UnknownField);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_messages_name_the_path() {
        let err = ConfigError::circular(Path::new("/tmp/a.yml"));
        assert!(err.to_string().contains("/tmp/a.yml"));

        let err = ConfigError::type_mismatch("max_archives", "int", Path::new("child.yml"));
        assert_eq!(
            err.to_string(),
            "field 'max_archives' in child.yml expects int"
        );
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::CircularDependency).unwrap();
        assert_eq!(json, "\"CIRCULAR_DEPENDENCY\"");
    }
}
