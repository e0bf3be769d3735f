//! Error types for memorial-plaque.
//!
//! This module defines all error types used throughout the crate, providing
//! detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for memorial-plaque operations.
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

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored record could not be found.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// The identifier or slug used for the lookup.
        key: String,
    },

    /// Another memorial page already uses the slug.
    #[error("memorial slug already taken: {0}")]
    SlugTaken(String),

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

    // === Catalog Errors ===
    /// The material type is not in the catalog.
    #[error("unknown material: {0}")]
    UnknownMaterial(String),

    /// The size id is not in the catalog.
    #[error("unknown plaque size: {0}")]
    UnknownSize(String),

    /// A stored or supplied value is not one of the allowed options.
    #[error("invalid {field}: '{value}'")]
    InvalidValue {
        /// Name of the field being parsed.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    // === QR Errors ===
    /// A color string is not a `#RRGGBB` hex value.
    #[error("invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    /// The encoder could not produce a QR code for the given text.
    #[error("failed to generate QR code: {message}")]
    QrGeneration {
        /// Description of what went wrong.
        message: String,
    },

    // === Order Errors ===
    /// The draft is missing fields required to place an order.
    #[error("order draft is incomplete, missing: {}", missing.join(", "))]
    IncompleteDraft {
        /// Names of the missing fields.
        missing: Vec<&'static str>,
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

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for memorial-plaque operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new QR generation error.
    #[must_use]
    pub fn qr_generation(message: impl Into<String>) -> Self {
        Self::QrGeneration {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a not-found error for the given record kind.
    #[must_use]
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Create an invalid-value error for the given field.
    #[must_use]
    pub fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }

    /// Check if this error means a record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from the QR encoder.
    #[must_use]
    pub fn is_qr_generation(&self) -> bool {
        matches!(self, Self::QrGeneration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownMaterial("granite".to_string());
        assert_eq!(err.to_string(), "unknown material: granite");

        let err = Error::qr_generation("data too long");
        assert_eq!(err.to_string(), "failed to generate QR code: data too long");
    }

    #[test]
    fn test_is_qr_generation() {
        assert!(Error::qr_generation("boom").is_qr_generation());
        assert!(!Error::internal("boom").is_qr_generation());
    }

    #[test]
    fn test_not_found() {
        let err = Error::not_found("memorial page", "jane-doe");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "memorial page not found: jane-doe");
        assert!(!Error::UnknownSize("x".to_string()).is_not_found());
    }

    #[test]
    fn test_incomplete_draft_display() {
        let err = Error::IncompleteDraft {
            missing: vec!["material", "text_color"],
        };
        assert_eq!(
            err.to_string(),
            "order draft is incomplete, missing: material, text_color"
        );
    }

    #[test]
    fn test_slug_taken_display() {
        let err = Error::SlugTaken("jane-doe".to_string());
        assert_eq!(err.to_string(), "memorial slug already taken: jane-doe");
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
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
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "invalid origin".to_string(),
        };
        assert!(err.to_string().contains("invalid origin"));
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
