use thiserror::Error;

/// Status classification used by the transport to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    NotFound,
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Missing required parameter: {field}")]
    MissingParameter { field: String },
    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },
    #[error("Image not found: {0}")]
    NotFound(String),
    #[error(
        "Model '{requested}' is not available. Available models: {}",
        .available.join(", ")
    )]
    InvalidModel {
        requested: String,
        available: Vec<String>,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn missing(field: &str) -> Self {
        Self::MissingParameter {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownTool(_)
            | Self::MissingParameter { .. }
            | Self::InvalidParameter { .. }
            | Self::InvalidModel { .. } => ErrorClass::Client,
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::Internal(_) => ErrorClass::Server,
        }
    }

    /// Stable name of the error kind reported alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "UnknownTool",
            Self::MissingParameter { .. } | Self::InvalidParameter { .. } => "ValidationError",
            Self::NotFound(_) => "NotFound",
            Self::InvalidModel { .. } => "InvalidModel",
            Self::Internal(_) => "InternalError",
        }
    }

    /// The offending parameter for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingParameter { field } | Self::InvalidParameter { field, .. } => {
                Some(field.as_str())
            }
            _ => None,
        }
    }
}
