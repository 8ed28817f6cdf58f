//! Flow controller - drives one provider's authentication flow end to end.
//!
//! Each iteration captures browser state, asks the proposer for one
//! action, executes it, reports the ground-truth result back, and verifies
//! the phase's exit condition against the URL. Advancement, retries and
//! aborts are decided here; the tracker and verifier stay policy-free and
//! pure respectively.

use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_bridge::{ActionProposer, Credentials, ProposalContext};
use authpilot_core_types::{AttemptId, ProviderId};
use browser_actions::{ActionExecutor, BrowserAction, CaptureError, PageState};
use chrono::Utc;
use remediation::{record_event, DiagnosticContext, RemediationEvent, Remediator};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::FlowConfig;
use crate::errors::FlowError;
use crate::phases::{names, PhaseSpec, PhaseTracker};
use crate::report::{AttemptReport, AttemptStatus};
use crate::verifier::{FlowVerifier, VerdictStatus};

/// Everything needed to run one provider's flow.
#[derive(Debug, Clone)]
pub struct ProviderFlow {
    pub provider: ProviderId,

    /// URL the flow starts from (and returns to after a remediation).
    pub start_url: String,

    /// Ordered phase sequence; fixed configuration for the attempt.
    pub phases: Vec<PhaseSpec>,

    /// Credentials for form-fill phases.
    pub credentials: Option<Credentials>,
}

/// Signal from one attempt pass back to the restart loop.
enum Signal {
    Completed,
    Failed(String),
    Blocked(String),
    Restart(String),
}

/// Orchestrates one complete attempt for one provider.
pub struct FlowController<E, P> {
    flow: ProviderFlow,
    executor: E,
    proposer: P,
    verifier: FlowVerifier,
    config: FlowConfig,
    remediator: Option<Arc<dyn Remediator>>,
}

impl<E, P> FlowController<E, P>
where
    E: ActionExecutor,
    P: ActionProposer,
{
    pub fn new(
        flow: ProviderFlow,
        executor: E,
        proposer: P,
        verifier: FlowVerifier,
        config: FlowConfig,
    ) -> Self {
        Self {
            flow,
            executor,
            proposer,
            verifier,
            config,
            remediator: None,
        }
    }

    /// Attach a diagnose-and-fix collaborator for blocker conditions.
    pub fn with_remediator(mut self, remediator: Arc<dyn Remediator>) -> Self {
        self.remediator = Some(remediator);
        self
    }

    /// The executor, for post-run inspection.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The proposer, for post-run inspection.
    pub fn proposer(&self) -> &P {
        &self.proposer
    }

    /// Run the flow to completion or terminal failure.
    ///
    /// The browser session is torn down on every exit path.
    pub async fn run(&mut self) -> AttemptReport {
        let attempt_id = AttemptId::new();
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(
            provider = %self.flow.provider,
            attempt = %attempt_id,
            phases = self.flow.phases.len(),
            "starting authentication flow"
        );

        let (status, message, tracker) = self.run_with_restarts().await;
        self.executor.close().await;

        info!(
            provider = %self.flow.provider,
            ?status,
            message = %message,
            "flow finished"
        );

        AttemptReport {
            attempt_id,
            provider: self.flow.provider.clone(),
            status,
            message,
            phase_reached: tracker.current_phase().map(|p| p.name.clone()),
            actions_in_final_phase: tracker.actions_in_phase(),
            history: tracker.history().to_vec(),
            started_at,
            finished_at: Utc::now(),
            duration_ms: clock.elapsed().as_millis() as u64,
        }
    }

    /// Outer loop: replay the whole flow after an applied remediation,
    /// bounded by the restart cap.
    async fn run_with_restarts(&mut self) -> (AttemptStatus, String, PhaseTracker) {
        let mut tracker = PhaseTracker::new(
            self.flow.phases.clone(),
            self.config.max_actions_per_phase,
            self.config.max_retries,
        );
        if tracker.phases().is_empty() {
            return (AttemptStatus::Failed, FlowError::EmptyPhases.to_string(), tracker);
        }

        let mut restarts = 0u32;
        loop {
            match self.run_attempt(&mut tracker).await {
                Signal::Completed => {
                    let message = format!("all {} phases verified", tracker.phases().len());
                    return (AttemptStatus::Passed, message, tracker);
                }
                Signal::Failed(message) => return (AttemptStatus::Failed, message, tracker),
                Signal::Blocked(message) => return (AttemptStatus::Blocked, message, tracker),
                Signal::Restart(summary) => {
                    restarts += 1;
                    if restarts > self.config.max_restarts {
                        let message = format!(
                            "restart cap ({}) reached; last remediation: {summary}",
                            self.config.max_restarts
                        );
                        return (AttemptStatus::Aborted, message, tracker);
                    }
                    info!(
                        provider = %self.flow.provider,
                        restarts,
                        summary = %summary,
                        "remediation applied; replaying flow from the first phase"
                    );
                    tracker.reset();
                    self.proposer.reset_memory().await;

                    let back_to_start = BrowserAction::Navigate {
                        url: self.flow.start_url.clone(),
                    };
                    let outcome = self.executor.execute(&back_to_start).await;
                    if !outcome.success {
                        let message = format!(
                            "could not return to {} after remediation: {}",
                            self.flow.start_url,
                            outcome.error.unwrap_or_else(|| "navigation failed".to_string())
                        );
                        return (AttemptStatus::Failed, message, tracker);
                    }
                }
            }
        }
    }

    /// One pass over the phase sequence.
    async fn run_attempt(&mut self, tracker: &mut PhaseTracker) -> Signal {
        while !tracker.is_complete() {
            let Some(phase) = tracker.current_phase().cloned() else {
                break;
            };

            // 1. Observe.
            let state = match self.capture_state().await {
                Ok(state) => state,
                Err(err) => {
                    warn!(phase = %phase.name, %err, "state capture failed");
                    if !tracker.retry() {
                        return Signal::Failed(format!(
                            "state capture kept failing in phase {}: {err}",
                            phase.name
                        ));
                    }
                    continue;
                }
            };

            // 2–3. Ask for one action.
            let goal = self.phase_goal(&phase);
            let context = ProposalContext {
                provider: self.flow.provider.clone(),
                phase: phase.name.clone(),
                url: state.url.clone(),
                credentials: self.credentials_for(&phase),
            };
            let action = match self.proposer.propose(&state.screenshot, &goal, &context).await {
                Ok(Some(action)) => action,
                Ok(None) => {
                    debug!(phase = %phase.name, "proposer returned no action");
                    if !tracker.retry() {
                        return Signal::Failed(format!(
                            "action proposer produced no action for phase {} and the retry \
                             budget is exhausted",
                            phase.name
                        ));
                    }
                    continue;
                }
                Err(err) => {
                    warn!(phase = %phase.name, %err, "proposer request failed");
                    if !tracker.retry() {
                        return Signal::Failed(format!(
                            "action proposer kept failing in phase {}: {err}",
                            phase.name
                        ));
                    }
                    continue;
                }
            };

            // 4. Act.
            debug!(phase = %phase.name, action = action.name(), "executing action");
            let outcome = self.executor.execute(&action).await;

            // 5. Feed ground truth back into the proposer's memory.
            let url_after = match self.current_url().await {
                Ok(url) => url,
                Err(_) => state.url.clone(),
            };
            self.proposer.report_outcome(&outcome, &url_after).await;

            // 6. Execution failure: remediate or spend a retry.
            if !outcome.success {
                let error = outcome
                    .error
                    .clone()
                    .unwrap_or_else(|| "action failed".to_string());
                warn!(phase = %phase.name, action = %outcome.action, error = %error, "action failed");
                if let Some(summary) = self
                    .try_remediate(&error, &url_after, Some(&state.screenshot))
                    .await
                {
                    return Signal::Restart(summary);
                }
                if !tracker.retry() {
                    return Signal::Failed(format!(
                        "action execution kept failing in phase {}: {error}",
                        phase.name
                    ));
                }
                continue;
            }

            // 7. Count it; runaway guard is fatal, never retried.
            tracker.record_action();
            if tracker.action_budget_exhausted() {
                return Signal::Failed(format!(
                    "exceeded max actions ({}) in phase {} without verifying its exit condition",
                    tracker.max_actions_per_phase(),
                    phase.name
                ));
            }

            // Let redirects land before inspecting the URL.
            sleep(phase.settle_delay).await;

            let url = match self.current_url().await {
                Ok(url) => url,
                Err(err) => {
                    warn!(phase = %phase.name, %err, "URL capture failed after action");
                    if !tracker.retry() {
                        return Signal::Failed(format!(
                            "could not observe the page URL in phase {}: {err}",
                            phase.name
                        ));
                    }
                    continue;
                }
            };

            // 8. Verify and interpret.
            let verdict = self.verifier.verify(
                &phase.name,
                &url,
                tracker.actions_in_phase(),
                tracker.max_actions_per_phase(),
            );
            match verdict.status {
                VerdictStatus::Advance => {
                    info!(
                        provider = %self.flow.provider,
                        phase = %phase.name,
                        actions = tracker.actions_in_phase(),
                        reason = %verdict.reason,
                        "phase verified"
                    );
                    tracker.advance();
                }
                VerdictStatus::Wait => {
                    debug!(phase = %phase.name, reason = %verdict.reason, "phase in progress");
                }
                VerdictStatus::BlockerError => {
                    warn!(phase = %phase.name, reason = %verdict.reason, "blocker condition");
                    if let Some(summary) = self
                        .try_remediate(&verdict.reason, &url, Some(&state.screenshot))
                        .await
                    {
                        return Signal::Restart(summary);
                    }
                    // Blockers never consume ordinary retries: retrying an
                    // unfixable condition cannot succeed.
                    return Signal::Blocked(verdict.reason);
                }
                VerdictStatus::Fail => {
                    warn!(phase = %phase.name, reason = %verdict.reason, "phase verification failed");
                    if !tracker.retry() {
                        return Signal::Failed(format!(
                            "phase {} failed verification after {} retries: {}",
                            phase.name,
                            tracker.retry_count(),
                            verdict.reason
                        ));
                    }
                }
            }
        }

        Signal::Completed
    }

    /// Capture state, tolerating one transient "page is navigating" error.
    async fn capture_state(&mut self) -> Result<PageState, FlowError> {
        match self.executor.capture_state().await {
            Ok(state) => Ok(state),
            Err(CaptureError::Navigating) => {
                debug!("page navigating during capture; retrying once");
                sleep(Duration::from_millis(self.config.capture_retry_delay_ms)).await;
                self.executor
                    .capture_state()
                    .await
                    .map_err(|err| FlowError::Capture(err.to_string()))
            }
            Err(err) => Err(FlowError::Capture(err.to_string())),
        }
    }

    /// Current URL with the same single-retry tolerance as capture.
    async fn current_url(&mut self) -> Result<String, FlowError> {
        match self.executor.current_url().await {
            Ok(url) => Ok(url),
            Err(CaptureError::Navigating) => {
                sleep(Duration::from_millis(self.config.capture_retry_delay_ms)).await;
                self.executor
                    .current_url()
                    .await
                    .map_err(|err| FlowError::Capture(err.to_string()))
            }
            Err(err) => Err(FlowError::Capture(err.to_string())),
        }
    }

    /// Goal string describing what should happen in the given phase.
    fn phase_goal(&self, phase: &PhaseSpec) -> String {
        let provider = self.flow.provider.as_str();
        match phase.name.as_str() {
            names::LANDING => {
                format!("Find and click the \"Sign in with {provider}\" button on the page.")
            }
            names::EMAIL_LOGIN => {
                "Fill the email sign-in form: click the email field, type the email address, \
                 then submit the form."
                    .to_string()
            }
            names::PROVIDER_AUTH => format!(
                "Complete the {provider} login form in order: 1) click the username field and \
                 type the username, 2) click the password field and type the password, 3) click \
                 the sign-in button. If an authorization prompt appears afterwards, approve it."
            ),
            names::CALLBACK => "Wait for the OAuth callback redirect to finish; only act if the \
                                page asks for explicit confirmation."
                .to_string(),
            names::DASHBOARD => "Confirm the authenticated area loaded; open the dashboard if a \
                                 link to it is visible."
                .to_string(),
            names::SIGNOUT => "Open the account menu and click sign out.".to_string(),
            other => format!("Complete the {other} step of the {provider} sign-in flow."),
        }
    }

    /// Credentials are only exposed to phases that fill forms.
    fn credentials_for(&self, phase: &PhaseSpec) -> Option<Credentials> {
        match phase.name.as_str() {
            names::PROVIDER_AUTH | names::EMAIL_LOGIN => self.flow.credentials.clone(),
            _ => None,
        }
    }

    /// Diagnose-and-fix path. Returns the applied fix summary when the flow
    /// should restart; `None` means no fix landed and ordinary handling
    /// applies.
    async fn try_remediate(
        &self,
        error_info: &str,
        page_url: &str,
        screenshot: Option<&[u8]>,
    ) -> Option<String> {
        let remediator = self.remediator.as_ref()?;
        if !self.config.auto_apply_fixes {
            info!(
                error = error_info,
                "remediator configured but auto-apply is off; surfacing for manual handling"
            );
            return None;
        }

        let provider = self.flow.provider.as_str();
        let context = DiagnosticContext {
            screenshot: screenshot.map(<[u8]>::to_vec),
            error_info: error_info.to_string(),
            network_logs: Vec::new(),
            page_url: page_url.to_string(),
        };

        let diagnostic = match remediator.diagnose(&context).await {
            Ok(diagnostic) => diagnostic,
            Err(err) => {
                warn!(%err, "diagnosis failed");
                return None;
            }
        };
        record_event(RemediationEvent::now(
            provider,
            "diagnosed",
            Some(diagnostic.root_cause.clone()),
        ));

        let plan = match remediator.propose_fix(&diagnostic).await {
            Ok(plan) => plan,
            Err(err) => {
                warn!(%err, "fix planning failed");
                return None;
            }
        };
        record_event(RemediationEvent::now(
            provider,
            "proposed",
            Some(plan.summary.clone()),
        ));

        match remediator.apply_fix(&plan, true).await {
            Ok(outcome) if outcome.applied_cleanly() => {
                info!(summary = %plan.summary, "remediation applied");
                record_event(RemediationEvent::now(provider, "applied", Some(plan.summary.clone())));
                Some(plan.summary)
            }
            Ok(outcome) => {
                warn!(failed = outcome.failed.len(), "fix did not apply cleanly");
                record_event(RemediationEvent::now(
                    provider,
                    "rejected",
                    Some(format!("{} change(s) failed to apply", outcome.failed.len())),
                ));
                None
            }
            Err(err) => {
                warn!(%err, "fix application failed");
                None
            }
        }
    }
}
