//! Error types for flightclaim.
//!
//! This module defines the crate-level error type shared by configuration,
//! storage and the lookup pipeline. Failures that belong to a single
//! component live next to it: [`crate::source::SourceError`] for the
//! tracking API and [`crate::lookup::LookupError`] for user-facing lookup
//! outcomes.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flightclaim operations.
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

    /// No saved claim exists with the given id.
    #[error("no saved claim with id '{id}'")]
    ClaimNotFound {
        /// The id that was looked up.
        id: String,
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

    // === Flight Data Errors ===
    /// No airline code could be extracted from a flight number.
    #[error("malformed flight number '{input}': expected 1-3 letters followed by digits")]
    MalformedFlightNumber {
        /// The offending input.
        input: String,
    },

    /// The local calendar day could not be mapped onto UTC.
    #[error("cannot compute the search window for {date}: {message}")]
    DayWindow {
        /// The requested date.
        date: chrono::NaiveDate,
        /// Description of what went wrong.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for flightclaim operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a malformed flight number error.
    #[must_use]
    pub fn malformed_flight_number(input: impl Into<String>) -> Self {
        Self::MalformedFlightNumber {
            input: input.into(),
        }
    }

    /// Create a timeout error for the named operation.
    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Check if this error means a flight number could not be parsed.
    #[must_use]
    pub fn is_malformed_flight_number(&self) -> bool {
        matches!(self, Self::MalformedFlightNumber { .. })
    }

    /// Check if this error is a missing saved claim.
    #[must_use]
    pub fn is_claim_not_found(&self) -> bool {
        matches!(self, Self::ClaimNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");

        let err = Error::timeout("flight search");
        assert_eq!(err.to_string(), "operation timed out: flight search");
    }

    #[test]
    fn test_malformed_flight_number() {
        let err = Error::malformed_flight_number("123ABC");
        assert!(err.is_malformed_flight_number());
        assert!(err.to_string().contains("123ABC"));
        assert!(!Error::internal("x").is_malformed_flight_number());
    }

    #[test]
    fn test_claim_not_found() {
        let err = Error::ClaimNotFound {
            id: "1700000000000-BA123".to_string(),
        };
        assert!(err.is_claim_not_found());
        assert!(err.to_string().contains("1700000000000-BA123"));
    }

    #[test]
    fn test_day_window_error_display() {
        let err = Error::DayWindow {
            date: chrono::NaiveDate::from_ymd_opt(2025, 3, 30).unwrap(),
            message: "midnight does not exist".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("2025-03-30"));
        assert!(msg.contains("midnight does not exist"));
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
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "airports must not be empty".to_string(),
        };
        assert!(err.to_string().contains("airports must not be empty"));
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
