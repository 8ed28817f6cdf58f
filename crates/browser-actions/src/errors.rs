//! Action-layer error types.

use thiserror::Error;

/// Errors raised when building or validating actions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The `action` tag did not match any known action kind.
    #[error("unknown action kind: {0}")]
    UnknownAction(String),

    /// A grid coordinate fell outside the normalized 0..=1000 range.
    #[error("coordinate {field}={value} outside normalized grid 0..=1000")]
    CoordinateOutOfRange { field: &'static str, value: u32 },

    /// The payload had a known tag but malformed fields.
    #[error("invalid action payload: {0}")]
    InvalidPayload(String),
}

/// Errors raised while capturing browser state.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The page is mid-navigation; a retry after a short delay usually succeeds.
    #[error("page is navigating, state not capturable yet")]
    Navigating,

    /// The driver could not produce a state snapshot.
    #[error("state capture failed: {0}")]
    Failed(String),
}
