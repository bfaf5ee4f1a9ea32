//! Error types for BDI analysis.

use thiserror::Error;

/// Input rejected before any model call is made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no consent: the user has not agreed to the analysis of their text")]
    NoConsent,

    #[error("empty input: there is no text to analyze")]
    EmptyInput,
}

/// Failure talking to the inference endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("model endpoint not available: {0}")]
    Unavailable(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

impl InferenceError {
    /// Worth another attempt when retries are configured
    pub fn is_transient(&self) -> bool {
        match self {
            InferenceError::Unavailable(_) | InferenceError::Timeout(_) | InferenceError::Http(_) => {
                true
            }
            InferenceError::Status { status, .. } => *status >= 500,
            InferenceError::ModelNotFound(_) | InferenceError::MalformedBody(_) => false,
        }
    }
}

/// Run-level failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("analysis cancelled after {completed} of {total} symptoms")]
    Cancelled { completed: usize, total: usize },
}
