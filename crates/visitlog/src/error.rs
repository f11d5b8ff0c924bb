//! Error types for visitlog.
//!
//! This module defines all error types used throughout the visitlog crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::form::ValidationErrors;

/// The main error type for visitlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// The database was written with a layout this build does not read.
    #[error("unsupported database schema version {found} (this build reads version {supported})")]
    UnsupportedSchema {
        /// Version found in the database.
        found: String,
        /// Version this build writes.
        supported: u32,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Record Errors ===
    /// Form input failed validation; nothing was recorded.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// A record with this id is already in the register.
    #[error("visitor id already registered: {id}")]
    DuplicateId {
        /// The clashing id.
        id: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for visitlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl Error {
    /// Create a duplicate id error.
    #[must_use]
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Check if this error carries field-level validation failures.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Field, FieldError};

    #[test]
    fn test_error_display() {
        let err = Error::duplicate_id("abc-123");
        assert_eq!(err.to_string(), "visitor id already registered: abc-123");
    }

    #[test]
    fn test_validation_error_predicates() {
        let errors = ValidationErrors::from(vec![FieldError::new(
            Field::Mobile,
            "Mobile number must be exactly 10 digits.",
        )]);
        let err: Error = errors.into();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("exactly 10 digits"));

        assert!(!Error::duplicate_id("x").is_validation_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_unsupported_schema_error_display() {
        let err = Error::UnsupportedSchema {
            found: "3".to_string(),
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "unsupported database schema version 3 (this build reads version 1)"
        );
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "storage key must not be empty".to_string(),
        };
        assert!(err.to_string().contains("storage key"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
