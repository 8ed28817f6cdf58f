//! Phase definitions and the per-attempt phase tracker.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical phase names the verifier knows exit conditions for.
pub mod names {
    pub const LANDING: &str = "landing";
    pub const EMAIL_LOGIN: &str = "email_login";
    pub const PROVIDER_AUTH: &str = "provider_auth";
    pub const CALLBACK: &str = "callback";
    pub const DASHBOARD: &str = "dashboard";
    pub const SIGNOUT: &str = "signout";
}

/// One logical phase in a provider's expected progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    /// Symbolic phase name (e.g. "landing", "provider_auth").
    pub name: String,

    /// How long to let the page settle after each action in this phase.
    /// Redirect-triggering phases default to a longer delay.
    #[serde(with = "millis")]
    pub settle_delay: Duration,
}

impl PhaseSpec {
    /// Phase with the default settle delay for its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let settle_delay = default_settle_delay(&name);
        Self { name, settle_delay }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// Default post-action settle delay per phase name.
///
/// Phases that end in a cross-domain redirect get extra time for the
/// navigation to land before the URL is inspected.
pub fn default_settle_delay(phase: &str) -> Duration {
    match phase {
        names::LANDING => Duration::from_millis(2_000),
        names::PROVIDER_AUTH | names::CALLBACK => Duration::from_millis(3_000),
        _ => Duration::from_millis(1_000),
    }
}

mod millis {
    use super::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Terminal event for one phase: advanced, or failed out of retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEvent {
    pub phase: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub actions_performed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Tracks progress through a provider's phase sequence for one attempt.
///
/// Mutated exclusively by the flow controller; never shared across
/// providers or concurrent attempts. Expected control-flow outcomes
/// (retries exhausted, already complete) are boolean returns, not errors.
#[derive(Debug)]
pub struct PhaseTracker {
    phases: Vec<PhaseSpec>,
    current: usize,
    actions_in_phase: u32,
    retries: u32,
    max_actions_per_phase: u32,
    max_retries: u32,
    history: Vec<PhaseEvent>,
}

impl PhaseTracker {
    pub fn new(phases: Vec<PhaseSpec>, max_actions_per_phase: u32, max_retries: u32) -> Self {
        Self {
            phases,
            current: 0,
            actions_in_phase: 0,
            retries: 0,
            max_actions_per_phase,
            max_retries,
            history: Vec::new(),
        }
    }

    /// Phase the attempt is currently in; `None` once complete.
    pub fn current_phase(&self) -> Option<&PhaseSpec> {
        self.phases.get(self.current)
    }

    /// Lookahead at the next phase without mutating.
    pub fn next_phase(&self) -> Option<&PhaseSpec> {
        self.phases.get(self.current + 1)
    }

    /// Record one executed action against the current phase.
    ///
    /// Returns the updated count. The caller checks
    /// [`PhaseTracker::action_budget_exhausted`] and treats a hit budget as
    /// fatal for the attempt, not as a retry.
    pub fn record_action(&mut self) -> u32 {
        self.actions_in_phase += 1;
        self.actions_in_phase
    }

    pub fn actions_in_phase(&self) -> u32 {
        self.actions_in_phase
    }

    pub fn action_budget_exhausted(&self) -> bool {
        self.actions_in_phase >= self.max_actions_per_phase
    }

    pub fn max_actions_per_phase(&self) -> u32 {
        self.max_actions_per_phase
    }

    pub fn retry_count(&self) -> u32 {
        self.retries
    }

    /// Advance past the current phase after its exit condition verified.
    ///
    /// Appends a success event and resets the per-phase counters. Returns
    /// false (and records nothing) when the attempt is already complete.
    pub fn advance(&mut self) -> bool {
        let Some(phase) = self.phases.get(self.current) else {
            return false;
        };
        self.history.push(PhaseEvent {
            phase: phase.name.clone(),
            timestamp: Utc::now(),
            success: true,
            actions_performed: self.actions_in_phase,
            reason: None,
        });
        self.current += 1;
        self.actions_in_phase = 0;
        self.retries = 0;
        true
    }

    /// Consume one unit of the current phase's retry budget.
    ///
    /// Returns true while budget remains; on exhaustion appends a failure
    /// event and returns false, after which the caller aborts the attempt.
    pub fn retry(&mut self) -> bool {
        self.retries += 1;
        if self.retries >= self.max_retries {
            let phase = self
                .phases
                .get(self.current)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            self.history.push(PhaseEvent {
                phase,
                timestamp: Utc::now(),
                success: false,
                actions_performed: self.actions_in_phase,
                reason: Some(format!("retry budget exhausted after {} attempts", self.retries)),
            });
            return false;
        }
        true
    }

    /// Complete means advanced past the last phase, so the final phase's
    /// own action/verification cycle has already run.
    pub fn is_complete(&self) -> bool {
        self.current >= self.phases.len()
    }

    /// Restart the whole attempt from the first phase.
    ///
    /// The only operation that moves the index backwards; used after a
    /// remediation is applied and the flow must be replayed.
    pub fn reset(&mut self) {
        self.current = 0;
        self.actions_in_phase = 0;
        self.retries = 0;
        self.history.clear();
    }

    /// Append-only phase event log, for reporting only.
    pub fn history(&self) -> &[PhaseEvent] {
        &self.history
    }

    pub fn phases(&self) -> &[PhaseSpec] {
        &self.phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> PhaseTracker {
        let phases = vec![
            PhaseSpec::new(names::LANDING),
            PhaseSpec::new(names::PROVIDER_AUTH),
            PhaseSpec::new(names::CALLBACK),
        ];
        PhaseTracker::new(phases, 10, 3)
    }

    #[test]
    fn advances_monotonically_one_phase_at_a_time() {
        let mut t = tracker();
        assert_eq!(t.current_phase().unwrap().name, names::LANDING);
        assert_eq!(t.next_phase().unwrap().name, names::PROVIDER_AUTH);

        assert!(t.advance());
        assert_eq!(t.current_phase().unwrap().name, names::PROVIDER_AUTH);
        assert!(t.advance());
        assert!(t.advance());
        assert!(t.is_complete());
        assert!(t.current_phase().is_none());
    }

    #[test]
    fn advance_when_complete_is_a_noop() {
        let mut t = tracker();
        assert!(t.advance());
        assert!(t.advance());
        assert!(t.advance());

        let history_len = t.history().len();
        assert!(!t.advance());
        assert_eq!(t.history().len(), history_len);
    }

    #[test]
    fn counters_reset_on_advance() {
        let mut t = tracker();
        t.record_action();
        t.record_action();
        assert!(t.retry());
        assert_eq!(t.actions_in_phase(), 2);
        assert_eq!(t.retry_count(), 1);

        assert!(t.advance());
        assert_eq!(t.actions_in_phase(), 0);
        assert_eq!(t.retry_count(), 0);

        let event = &t.history()[0];
        assert!(event.success);
        assert_eq!(event.actions_performed, 2);
    }

    #[test]
    fn retry_fails_on_exactly_the_final_allowance() {
        let mut t = tracker();
        assert!(t.retry());
        assert!(t.retry());
        assert!(!t.retry());

        let event = t.history().last().unwrap();
        assert!(!event.success);
        assert!(event.reason.as_deref().unwrap().contains("retry budget"));
    }

    #[test]
    fn completion_boundary_is_past_the_last_phase() {
        let mut t = tracker();
        assert!(!t.is_complete());
        t.advance();
        t.advance();
        assert!(!t.is_complete());
        t.advance();
        assert!(t.is_complete());
    }

    #[test]
    fn reset_restarts_the_attempt() {
        let mut t = tracker();
        t.record_action();
        t.advance();
        t.retry();
        t.reset();

        assert_eq!(t.current_phase().unwrap().name, names::LANDING);
        assert_eq!(t.actions_in_phase(), 0);
        assert_eq!(t.retry_count(), 0);
        assert!(t.history().is_empty());
    }

    #[test]
    fn action_budget_boundary() {
        let mut t = PhaseTracker::new(vec![PhaseSpec::new(names::LANDING)], 2, 3);
        t.record_action();
        assert!(!t.action_budget_exhausted());
        t.record_action();
        assert!(t.action_budget_exhausted());
    }

    #[test]
    fn redirect_phases_get_longer_settle_delays() {
        assert!(
            PhaseSpec::new(names::PROVIDER_AUTH).settle_delay
                > PhaseSpec::new(names::DASHBOARD).settle_delay
        );
        let custom = PhaseSpec::new(names::DASHBOARD).with_settle_delay(Duration::from_millis(50));
        assert_eq!(custom.settle_delay, Duration::from_millis(50));
    }
}
