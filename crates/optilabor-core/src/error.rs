//! Error types for OptiLabor.

use thiserror::Error;

/// Result type alias using OptiLabor's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for OptiLabor operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-SQL store rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tag detection collaborator failed
    #[error("Detection error: {0}")]
    Detection(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from a persistence layer (SQL store, blob store, disk).
    ///
    /// Reconciliation defines no other failure kind; callers use this to decide
    /// how to report a failed write to the end user.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Storage(_) | Error::Io(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Detection(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("plan_A.pdf".to_string());
        assert_eq!(err.to_string(), "Not found: plan_A.pdf");
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("write rejected".to_string());
        assert_eq!(err.to_string(), "Storage error: write rejected");
    }

    #[test]
    fn test_error_display_detection() {
        let err = Error::Detection("sidecar returned 503".to_string());
        assert_eq!(err.to_string(), "Detection error: sidecar returned 503");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("file name cannot be empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: file name cannot be empty");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("PORT must be a number".to_string());
        assert_eq!(err.to_string(), "Configuration error: PORT must be a number");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_persistence_classification() {
        assert!(Error::Database(sqlx::Error::PoolTimedOut).is_persistence());
        assert!(Error::Storage("disk full".to_string()).is_persistence());
        assert!(
            Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "eio")).is_persistence()
        );

        assert!(!Error::InvalidInput("bad".to_string()).is_persistence());
        assert!(!Error::Detection("down".to_string()).is_persistence());
        assert!(!Error::NotFound("x".to_string()).is_persistence());
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: Error = sqlx::Error::PoolClosed.into();
        match err {
            Error::Database(_) => {}
            _ => panic!("Expected Database error"),
        }
    }

    #[test]
    fn test_from_serde_json_error_maintains_message() {
        let json_err = serde_json::from_str::<serde_json::Value>(r#"{"invalid": json}"#);
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        assert!(err.to_string().contains("Serialization error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
