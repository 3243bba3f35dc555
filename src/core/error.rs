// Copyright @yucwang 2026

use thiserror::Error;

/// Failures reported by the photon engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhotonError {
    /// Malformed call parameters: negative counts, mismatched lengths.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The requested computation has no meaning for the current data.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, PhotonError>;

pub(crate) fn invalid_argument<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(PhotonError::InvalidArgument(msg.into()))
}

pub(crate) fn invalid_state<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(PhotonError::InvalidState(msg.into()))
}
