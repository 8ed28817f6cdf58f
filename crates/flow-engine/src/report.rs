//! Per-attempt result records.

use authpilot_core_types::{AttemptId, ProviderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phases::PhaseEvent;

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Every phase advanced.
    Passed,
    /// Retries exhausted, action budget hit, or proposer stalled.
    Failed,
    /// A blocker condition that needs out-of-band action.
    Blocked,
    /// Externally bounded stop (e.g. restart cap after remediations).
    Aborted,
}

/// Structured record of one flow attempt, written once per attempt for
/// downstream reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    pub attempt_id: AttemptId,
    pub provider: ProviderId,
    pub status: AttemptStatus,

    /// Terminal message; for blockers this is a specific, actionable
    /// explanation rather than a generic failure.
    pub message: String,

    /// Phase the attempt ended in; `None` when all phases completed.
    pub phase_reached: Option<String>,

    /// Actions performed in the final (or failing) phase.
    pub actions_in_final_phase: u32,

    /// Terminal phase events, in order.
    pub history: Vec<PhaseEvent>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl AttemptReport {
    pub fn is_success(&self) -> bool {
        matches!(self.status, AttemptStatus::Passed)
    }
}
