//! Global error types for Secure Talk.
//!
//! All error categories across the workspace are unified into a single
//! `StError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using StError.
pub type StResult<T> = Result<T, StError>;

/// Unified error type covering all error categories in Secure Talk.
#[derive(Error, Debug)]
pub enum StError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Document store errors --
    /// Underlying database error.
    #[error("store error: {0}")]
    Store(String),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// The store refused an operation on a document path.
    ///
    /// This is the only error that carries store permission context; the
    /// flow registry rebroadcasts it on the event bus.
    #[error("permission denied: {operation} on {path}")]
    PermissionDenied {
        /// Operation that was refused ("get", "set", "delete", "list", "commit").
        operation: String,
        /// Document or collection path.
        path: String,
    },

    /// A document path is malformed (empty segment, wrong depth).
    #[error("invalid document path: {0}")]
    InvalidPath(String),

    /// A create hit a document that already exists.
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// Document not found.
    #[error("document not found: {0}")]
    NotFound(String),

    // -- Network errors --
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(String),

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Remote service returned an error response.
    #[error("server error (status {status}): {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Error body or message.
        message: String,
    },

    /// Authentication against a remote service failed.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    // -- Model errors --
    /// The text model returned nothing usable.
    #[error("model error: {0}")]
    Model(String),

    // -- Push errors --
    /// Push delivery could not be attempted.
    #[error("push error: {0}")]
    Push(String),

    // -- Flow errors --
    /// Flow input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No flow registered under this name.
    #[error("unknown flow: {0}")]
    UnknownFlow(String),

    /// A flow failed after its retry policy was exhausted.
    #[error("flow {flow} failed: {message}")]
    FlowFailed {
        /// Flow name.
        flow: String,
        /// Last error message.
        message: String,
    },

    // -- Account errors --
    /// Username is already claimed by another user.
    #[error("username taken: {0}")]
    UsernameTaken(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StError {
    /// HTTP status the flow server answers with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::InvalidPath(_) | Self::UsernameTaken(_) => 400,
            Self::AuthFailed(_) => 401,
            Self::PermissionDenied { .. } => 403,
            Self::UnknownFlow(_) | Self::NotFound(_) => 404,
            Self::AlreadyExists(_) => 409,
            Self::Model(_)
            | Self::Push(_)
            | Self::Http(_)
            | Self::Timeout(_)
            | Self::ServerError { .. }
            | Self::FlowFailed { .. } => 502,
            _ => 500,
        }
    }

    /// Whether this error is a store permission denial.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

impl From<serde_json::Error> for StError {
    fn from(e: serde_json::Error) -> Self {
        StError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for StError {
    fn from(e: toml::de::Error) -> Self {
        StError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_st_error_display() {
        let err = StError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_permission_denied_display() {
        let err = StError::PermissionDenied {
            operation: "set".into(),
            path: "groups/g1".into(),
        };
        assert_eq!(err.to_string(), "permission denied: set on groups/g1");
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(StError::InvalidInput("x".into()).http_status(), 400);
        assert_eq!(StError::UnknownFlow("x".into()).http_status(), 404);
        assert_eq!(StError::AlreadyExists("usernames/asha".into()).http_status(), 409);
        assert_eq!(StError::Model("x".into()).http_status(), 502);
        assert_eq!(StError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn test_from_serde_json() {
        let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(StError::from(e), StError::Serialization(_)));
    }
}
