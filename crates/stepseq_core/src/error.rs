//! Error types for stepseq

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("Invalid params: {0}")]
    Params(#[source] serde_json::Error),
    #[error("Invalid state: {0}")]
    State(#[source] serde_json::Error),
    #[error("State must be a JSON object, got {0}")]
    StateNotObject(String),
}

pub type Result<T> = std::result::Result<T, SequencerError>;
