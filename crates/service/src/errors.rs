use models::{DogId, ModelError};
use thiserror::Error;

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connect, timeout or body read failure.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Non-2xx status.
    #[error("{path} rejected with status {status}")]
    Rejected { status: u16, path: String },
    /// Body did not match the expected schema.
    #[error("decode failure: {0}")]
    Decode(String),
    /// Request never sent because the input failed validation.
    #[error("invalid request: {0}")]
    Invalid(String),
}

/// Coarse failure class surfaced to the presentation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Transport,
    Rejected,
    Decode,
    Invalid,
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Transport(_) => FailureKind::Transport,
            ApiError::Rejected { .. } => FailureKind::Rejected,
            ApiError::Decode(_) => FailureKind::Decode,
            ApiError::Invalid(_) => FailureKind::Invalid,
        }
    }

    /// Transport failures and 5xx may succeed on a second attempt; nothing else will.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Rejected { status, .. } => *status >= 500,
            ApiError::Decode(_) | ApiError::Invalid(_) => false,
        }
    }

    pub fn rejected(status: u16, path: &str) -> Self {
        ApiError::Rejected { status, path: path.to_string() }
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ApiError::Invalid(msg),
            ModelError::Decode(msg) => ApiError::Decode(msg),
        }
    }
}

/// A user intent the search view cannot act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error("invalid intent: {0}")]
    Invalid(#[from] ModelError),
    #[error("dog {0} is not on the current page")]
    UnknownDog(DogId),
    #[error("match is unavailable until at least one dog is a favorite")]
    MatchUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_server_errors_are_retryable() {
        assert!(ApiError::Transport("reset".into()).is_retryable());
        assert!(ApiError::rejected(503, "dogs").is_retryable());
        assert!(!ApiError::rejected(401, "dogs").is_retryable());
        assert!(!ApiError::Decode("eof".into()).is_retryable());
        assert!(!ApiError::Invalid("page".into()).is_retryable());
    }

    #[test]
    fn model_errors_map_onto_matching_kind() {
        let v: ApiError = ModelError::Validation("x".into()).into();
        assert_eq!(v.kind(), FailureKind::Invalid);
        let d: ApiError = ModelError::Decode("x".into()).into();
        assert_eq!(d.kind(), FailureKind::Decode);
    }
}
