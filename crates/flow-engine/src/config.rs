//! Configuration for flow execution.

use serde::{Deserialize, Serialize};

/// Budgets and switches for one flow attempt.
///
/// Safety relies on bounded counters rather than wall-clock timeouts:
/// page-load timing is too variable to deadline, while action and retry
/// ceilings bound the loop deterministically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Actions tolerated within a single phase before the attempt is
    /// aborted as a runaway loop.
    /// Default: 10
    pub max_actions_per_phase: u32,

    /// Consecutive verification failures tolerated per phase.
    /// Default: 3
    pub max_retries: u32,

    /// Full attempt restarts allowed after applied remediations.
    /// Default: 2
    pub max_restarts: u32,

    /// Apply proposed fixes without manual approval.
    /// Default: false
    pub auto_apply_fixes: bool,

    /// Delay before retrying a state capture that failed mid-navigation,
    /// in milliseconds.
    /// Default: 500
    pub capture_retry_delay_ms: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_actions_per_phase: 10,
            max_retries: 3,
            max_restarts: 2,
            auto_apply_fixes: false,
            capture_retry_delay_ms: 500,
        }
    }
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight budgets for tests.
    pub fn minimal() -> Self {
        Self {
            max_actions_per_phase: 4,
            max_retries: 2,
            max_restarts: 1,
            auto_apply_fixes: false,
            capture_retry_delay_ms: 10,
        }
    }

    /// Builder: set the per-phase action ceiling.
    pub fn actions_per_phase(mut self, count: u32) -> Self {
        self.max_actions_per_phase = count;
        self
    }

    /// Builder: set the per-phase retry ceiling.
    pub fn retries(mut self, count: u32) -> Self {
        self.max_retries = count;
        self
    }

    /// Builder: set the restart cap.
    pub fn restarts(mut self, count: u32) -> Self {
        self.max_restarts = count;
        self
    }

    /// Builder: toggle automatic fix application.
    pub fn auto_fix(mut self, enabled: bool) -> Self {
        self.auto_apply_fixes = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FlowConfig::default();
        assert_eq!(config.max_actions_per_phase, 10);
        assert_eq!(config.max_retries, 3);
        assert!(!config.auto_apply_fixes);
    }

    #[test]
    fn builder() {
        let config = FlowConfig::new().actions_per_phase(5).retries(1).auto_fix(true);
        assert_eq!(config.max_actions_per_phase, 5);
        assert_eq!(config.max_retries, 1);
        assert!(config.auto_apply_fixes);
    }
}
