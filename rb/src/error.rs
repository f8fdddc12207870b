//! Error types for the poll cycle

use thiserror::Error;

/// Shape problems with a decoded API payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("API response is not an object")]
    NotAnObject,

    #[error("API response has no '{0}' field")]
    MissingField(&'static str),

    #[error("'homeworks' is not a list")]
    NotAList,

    #[error("'current_date' is not an integer timestamp")]
    InvalidCursor,

    #[error("no homework updates")]
    Empty,
}

impl ResponseError {
    /// An empty batch is the normal steady state, not a failure
    pub fn is_expected(&self) -> bool {
        matches!(self, ResponseError::Empty)
    }
}

/// Problems with one homework record inside an otherwise valid batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("homework record is not an object")]
    NotAnObject,

    #[error("homework record has no '{0}' field")]
    MissingField(&'static str),

    #[error("unknown review status: {0}")]
    UnknownStatus(String),
}

/// Transport-level failures talking to the status API
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(std::time::Duration),
}

/// Failures delivering a chat message
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Message rejected: {0}")]
    Rejected(String),
}

// The Bot API carries the token in the URL path, so it never goes into the error
impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Network(e.without_url())
    }
}

/// Why a poll cycle ended without a result
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("status API unreachable: {0}")]
    Transport(#[from] FetchError),

    #[error("status API returned HTTP {status}")]
    RemoteUnavailable { status: u16 },

    #[error("status API body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API response: {0}")]
    InvalidResponse(#[from] ResponseError),

    #[error("poll cycle panicked: {0}")]
    Panicked(String),
}

impl CycleError {
    /// Transport failures usually mean misconfiguration and stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, CycleError::Transport(_))
    }

    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            CycleError::RemoteUnavailable { status } => Some(*status),
            _ => None,
        }
    }
}
