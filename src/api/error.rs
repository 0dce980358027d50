//! API error taxonomy.
//!
//! Mutation callers receive the full `ApiError` untouched. The cache needs
//! a cloneable descriptor it can hold inside shared entries, so fetch
//! failures are flattened into `FetchFailure` at the gateway boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode response body: {0}")]
    Decode(String),
    /// 4xx-class failure: the request was rejected, server state is
    /// presumed unchanged.
    #[error("validation error (status {status}): {message}")]
    Validation { status: u16, message: String },
    /// 5xx-class failure. Retry policy is a caller concern.
    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// HTTP status code, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Url(_) | Self::Decode(_) => None,
        }
    }

    /// True for 4xx-class rejections where no state change is presumed.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Broad classification of a failed read, kept alongside stale data in
/// cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Could not reach the server or the connection failed mid-flight.
    Transport,
    /// 4xx-class rejection.
    Validation,
    /// 5xx-class failure.
    Server,
    /// The response arrived but its body did not match the envelope.
    Decode,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Validation => "validation",
            Self::Server => "server",
            Self::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Cloneable failure descriptor stored in cache entries and surfaced in
/// controller snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure: {message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
}

impl FetchFailure {
    pub fn new(kind: FailureKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }
}

impl From<&ApiError> for FetchFailure {
    fn from(err: &ApiError) -> Self {
        let kind = match err {
            ApiError::Validation { .. } => FailureKind::Validation,
            ApiError::Server { .. } => FailureKind::Server,
            ApiError::Decode(_) => FailureKind::Decode,
            ApiError::Url(_) | ApiError::Http(_) => FailureKind::Transport,
        };
        Self::new(kind, err.status(), err.to_string())
    }
}

impl From<ApiError> for FetchFailure {
    fn from(err: ApiError) -> Self {
        Self::from(&err)
    }
}
