//! Remediation layer
//!
//! Diagnose-and-fix collaborators invoked on blocker conditions and
//! repeated execution failures: a [`Remediator`] produces a root-cause
//! [`Diagnostic`], turns it into a [`FixPlan`], and applies the plan when
//! the run is configured to auto-approve fixes.

pub mod events;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use events::{recent_events, record_event, RemediationEvent};
pub use http::HttpRemediator;

/// Errors from remediation collaborators.
#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("diagnosis failed: {0}")]
    Diagnosis(String),

    #[error("fix planning failed: {0}")]
    Planning(String),

    #[error("fix application failed: {0}")]
    Application(String),
}

/// Evidence bundle handed to the diagnostician.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticContext {
    /// Screenshot at the moment of failure, when available.
    pub screenshot: Option<Vec<u8>>,

    /// Error description from the flow (verifier reason or executor error).
    pub error_info: String,

    /// Captured network log lines, when the driver provides them.
    pub network_logs: Vec<String>,

    /// Page URL at the moment of failure.
    pub page_url: String,
}

/// Root-cause analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub root_cause: String,

    /// Confidence in the root cause, 0.0..=1.0.
    pub confidence: f32,

    pub evidence: Vec<String>,

    pub fix_suggestions: Vec<String>,
}

/// Risk classification of a proposed fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One concrete change within a fix plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixChange {
    /// What is being changed (file, table, account record...).
    pub target: String,

    pub description: String,
}

/// A concrete, applicable fix derived from a diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixPlan {
    pub changes: Vec<FixChange>,

    pub risk: RiskLevel,

    /// High-risk plans set this; they are only applied under an explicit
    /// auto-approve configuration.
    pub requires_approval: bool,

    pub summary: String,
}

/// Result of applying a fix plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixOutcome {
    /// Targets changed successfully.
    pub successful: Vec<String>,

    /// Targets that could not be changed.
    pub failed: Vec<String>,
}

impl FixOutcome {
    /// True when every change landed and at least one was attempted.
    pub fn applied_cleanly(&self) -> bool {
        self.failed.is_empty() && !self.successful.is_empty()
    }
}

/// Diagnose-and-fix collaborator.
#[async_trait]
pub trait Remediator: Send + Sync {
    /// Analyze a failure and name its most likely root cause.
    async fn diagnose(&self, context: &DiagnosticContext) -> Result<Diagnostic, RemediationError>;

    /// Turn a diagnostic into a concrete fix plan.
    async fn propose_fix(&self, diagnostic: &Diagnostic) -> Result<FixPlan, RemediationError>;

    /// Apply a fix plan. Only invoked with `approved: true` when the run
    /// is configured to auto-approve; otherwise the plan is surfaced for
    /// manual handling.
    async fn apply_fix(
        &self,
        plan: &FixPlan,
        approved: bool,
    ) -> Result<FixOutcome, RemediationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_application_requires_successes() {
        assert!(!FixOutcome::default().applied_cleanly());

        let outcome = FixOutcome {
            successful: vec!["accounts.user_links".to_string()],
            failed: Vec::new(),
        };
        assert!(outcome.applied_cleanly());

        let partial = FixOutcome {
            successful: vec!["a".to_string()],
            failed: vec!["b".to_string()],
        };
        assert!(!partial.applied_cleanly());
    }
}
