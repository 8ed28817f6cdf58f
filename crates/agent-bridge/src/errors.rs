//! Proposer-layer error types.

use thiserror::Error;

/// Errors from the action-proposing agent.
///
/// "No action found" is not an error; `propose` returns `Ok(None)` for
/// that. These variants cover true transport/API failures only.
#[derive(Debug, Error)]
pub enum ProposerError {
    /// The agent endpoint could not be reached or returned a non-success status.
    #[error("proposer transport failure: {0}")]
    Transport(String),

    /// The agent answered with a payload we could not interpret.
    #[error("proposer returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProposerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
