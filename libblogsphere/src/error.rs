//! Error types for BlogSphere

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlogError>;

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// How a failed request is surfaced to the user.
///
/// The mapping is global: every request issued by the interaction layer goes
/// through the same classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Server answered but reported `success: false`; its message is shown verbatim.
    Application,
    /// HTTP 401; the user is sent to the login page.
    Unauthorized,
    /// HTTP 403; a permission notice is shown.
    Forbidden,
    /// Anything else; a generic notice is shown.
    Generic,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request rejected: {0}")]
    Application(String),

    #[error("Not logged in")]
    Unauthorized,

    #[error("Permission denied")]
    Forbidden,

    #[error("HTTP {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify this error for user-facing reporting
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Application(_) => FailureKind::Application,
            ApiError::Unauthorized => FailureKind::Unauthorized,
            ApiError::Forbidden => FailureKind::Forbidden,
            ApiError::Status { .. } | ApiError::Transport(_) | ApiError::Decode(_) => {
                FailureKind::Generic
            }
        }
    }

    /// Map a non-success HTTP status to an error, keeping any server message
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            _ => ApiError::Status { status, message },
        }
    }

    /// Message the server attached to the failure, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Application(message) => Some(message),
            ApiError::Status {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Local storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    #[error("Stored value is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}
