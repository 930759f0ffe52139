use thiserror::Error;

/// Errors raised while preparing or sending a submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid destination: {0}")]
    Destination(String),
    #[error("core error: {0}")]
    Core(#[from] leadform_core::Error),
}

impl From<reqwest::Error> for SubmitError {
    fn from(value: reqwest::Error) -> Self {
        SubmitError::Transport(value.to_string())
    }
}

/// Failures reported by the modal collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModalError {
    #[error("modal \"{0}\" not found")]
    UnknownModal(String),
    #[error("modal failure: {0}")]
    Other(String),
}

/// Result type for submission operations.
pub type SubmitResult<T> = std::result::Result<T, SubmitError>;
