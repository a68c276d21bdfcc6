use thiserror::Error;

/// Result type for preparation and dispatch operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that stop a test request.
///
/// Data problems (empty selections, zero totals) are not errors: they are
/// reported as warnings in the assumption report.
#[derive(Error, Debug)]
pub enum EngineError {
    /// `testType` other than chi-square
    #[error("Unsupported test type: {0}")]
    InvalidTestType(String),

    /// Unknown chi-square subtype
    #[error("Invalid Chi-Square subtype: {0}")]
    InvalidSubtype(String),

    /// Malformed grouping, combination or distribution request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown project, or a project the requester does not own
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Numeric service failure (transport, non-2xx, malformed body)
    #[error("Numeric service error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Upstream { status: Option<u16>, message: String },

    /// Service answered without a p-value
    #[error("Analysis did not produce a p-value")]
    MissingPValue,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Stable machine-readable code for error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTestType(_) | Self::InvalidSubtype(_) | Self::InvalidRequest(_) => {
                "invalid_request"
            }
            Self::ProjectNotFound(_) => "not_found",
            Self::Upstream { .. } | Self::MissingPValue => "upstream_error",
            Self::Serialization(_) | Self::Io(_) => "internal",
        }
    }

    /// HTTP status a surface should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidTestType(_) | Self::InvalidSubtype(_) | Self::InvalidRequest(_) => 400,
            Self::ProjectNotFound(_) => 404,
            Self::Upstream {
                status: Some(status),
                ..
            } if (400..=599).contains(status) => *status,
            Self::Upstream { .. } => 502,
            Self::MissingPValue | Self::Serialization(_) | Self::Io(_) => 500,
        }
    }
}
