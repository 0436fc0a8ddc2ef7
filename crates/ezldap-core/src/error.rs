//! Error types
//!
//! Errors raised by the directory port, the attribute accessor and the
//! resolution engine. Not-found conditions are never errors: lookups return
//! `None` for them.

use std::sync::Arc;

use thiserror::Error;

type SharedSource = Arc<dyn std::error::Error + Send + Sync>;

/// Error raised by a [`DirectoryQueryPort`](crate::port::DirectoryQueryPort).
///
/// Cloneable so cached failures can be handed out to every waiting caller.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The search base does not exist in the directory.
    #[error("no such object: {dn}")]
    NameNotFound { dn: String },

    /// Failed to establish or bind a connection.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<SharedSource>,
    },

    /// The directory did not answer in time.
    #[error("directory operation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Any other failed directory operation.
    #[error("directory operation failed: {message}")]
    Operation {
        message: String,
        #[source]
        source: Option<SharedSource>,
    },

    /// Port configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// More entries matched a uniqueness-checked search than its limit.
    #[error("search matched more than {limit} entries")]
    SizeLimitExceeded { limit: u32 },
}

impl DirectoryError {
    /// Create a name-not-found error.
    pub fn name_not_found(dn: impl Into<String>) -> Self {
        DirectoryError::NameNotFound { dn: dn.into() }
    }

    /// Create a connection failure without source.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        DirectoryError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failure wrapping a source error.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::ConnectionFailed {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Create an operation failure without source.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        DirectoryError::Operation {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation failure wrapping a source error.
    pub fn operation_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::Operation {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Whether this is the missing-base condition.
    pub fn is_name_not_found(&self) -> bool {
        matches!(self, DirectoryError::NameNotFound { .. })
    }

    /// Whether a uniqueness-checked search matched too many entries.
    pub fn is_size_limit_exceeded(&self) -> bool {
        matches!(self, DirectoryError::SizeLimitExceeded { .. })
    }

    /// Whether retrying may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DirectoryError::ConnectionFailed { .. } | DirectoryError::Timeout { .. }
        )
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            DirectoryError::NameNotFound { .. } => "NAME_NOT_FOUND",
            DirectoryError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            DirectoryError::Timeout { .. } => "TIMEOUT",
            DirectoryError::Operation { .. } => "OPERATION_FAILED",
            DirectoryError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            DirectoryError::SizeLimitExceeded { .. } => "SIZE_LIMIT_EXCEEDED",
        }
    }
}

/// Result alias for port operations.
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Failure to read a single attribute value.
///
/// Never leaves the attribute mapper; it is logged and treated as absence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// The attribute only carries binary values.
    #[error("attribute '{attribute}' has no UTF-8 value")]
    NotUtf8 { attribute: String },

    /// The accessor could not read the attribute.
    #[error("attribute '{attribute}' could not be read: {message}")]
    Unreadable { attribute: String, message: String },
}

/// Error raised by the resolution engine.
#[derive(Debug, Clone, Error)]
pub enum LdapServiceError {
    /// Caller input rejected before any query was issued.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The directory failed for reasons other than a missing entry.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl LdapServiceError {
    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            LdapServiceError::InvalidArgument(_) => "INVALID_ARGUMENT",
            LdapServiceError::Directory(e) => e.error_code(),
        }
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, LdapServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DirectoryError::connection_failed("down").is_transient());
        assert!(DirectoryError::Timeout { timeout_secs: 5 }.is_transient());
        assert!(!DirectoryError::name_not_found("dc=org").is_transient());
        assert!(!DirectoryError::operation_failed("rc=50").is_transient());
    }

    #[test]
    fn test_size_limit_exceeded() {
        let err = DirectoryError::SizeLimitExceeded { limit: 1 };
        assert!(err.is_size_limit_exceeded());
        assert!(!err.is_transient());
        assert_eq!(err.error_code(), "SIZE_LIMIT_EXCEEDED");
        assert_eq!(err.to_string(), "search matched more than 1 entries");
    }

    #[test]
    fn test_name_not_found_display() {
        let err = DirectoryError::name_not_found("dc=org");
        assert!(err.is_name_not_found());
        assert_eq!(err.to_string(), "no such object: dc=org");
        assert_eq!(err.error_code(), "NAME_NOT_FOUND");
    }

    #[test]
    fn test_source_is_preserved_through_clone() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = DirectoryError::connection_failed_with_source("bind failed", io);
        let cloned = err.clone();
        let source = std::error::Error::source(&cloned).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("refused"));
    }

    #[test]
    fn test_service_error_from_directory_error() {
        let err: LdapServiceError = DirectoryError::Timeout { timeout_secs: 3 }.into();
        assert_eq!(err.error_code(), "TIMEOUT");
        assert_eq!(
            err.to_string(),
            "directory operation timed out after 3 seconds"
        );
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = LdapServiceError::InvalidArgument("phrase too short".into());
        assert_eq!(err.to_string(), "invalid argument: phrase too short");
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }
}
