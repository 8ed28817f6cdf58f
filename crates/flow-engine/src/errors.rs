//! Flow-engine error types.
//!
//! Expected control-flow outcomes (verification WAIT/FAIL, exhausted
//! retries, already complete) are represented as values, not errors; these
//! variants cover genuine faults only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    /// State capture failed even after the transient-navigation retry.
    #[error("state capture failed: {0}")]
    Capture(String),

    /// A flow was configured without phases.
    #[error("provider flow has no phases configured")]
    EmptyPhases,
}
