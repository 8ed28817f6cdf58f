//! End-to-end controller scenarios against scripted executor/proposer doubles.

use std::sync::Arc;
use std::time::Duration;

use agent_bridge::MockProposer;
use async_trait::async_trait;
use authpilot_core_types::ProviderId;
use browser_actions::{BrowserAction, ScriptedExecutor, ScriptedStep};
use flow_engine::{
    names, AttemptStatus, FlowConfig, FlowController, FlowVerifier, PhaseSpec, ProviderFlow,
    VerifyPolicy,
};
use remediation::{
    Diagnostic, DiagnosticContext, FixChange, FixOutcome, FixPlan, RemediationError, Remediator,
    RiskLevel,
};

const START: &str = "https://app.test/signin";
const GITHUB_LOGIN: &str = "https://github.com/login";
const DASHBOARD: &str = "https://app.test/dashboard";
const LINK_ERROR: &str = "https://app.test/signin?error=OAuthAccountNotLinked";

fn phase(name: &str) -> PhaseSpec {
    PhaseSpec::new(name).with_settle_delay(Duration::from_millis(1))
}

fn standard_phases() -> Vec<PhaseSpec> {
    vec![
        phase(names::LANDING),
        phase(names::PROVIDER_AUTH),
        phase(names::CALLBACK),
        phase(names::DASHBOARD),
    ]
}

fn flow() -> ProviderFlow {
    ProviderFlow {
        provider: ProviderId::from("github"),
        start_url: START.to_string(),
        phases: standard_phases(),
        credentials: None,
    }
}

fn verifier() -> FlowVerifier {
    FlowVerifier::new(VerifyPolicy::for_domains("app.test", "github.com"))
}

fn config() -> FlowConfig {
    let mut config = FlowConfig::new().actions_per_phase(10).retries(3);
    config.capture_retry_delay_ms = 10;
    config
}

fn click() -> BrowserAction {
    BrowserAction::ClickAt { x: 500, y: 400 }
}

/// Happy path: landing redirects to the provider after one action, the
/// provider form takes exactly three actions before the URL returns home,
/// the callback resolves cleanly, the dashboard URL matches.
#[tokio::test]
async fn scenario_happy_path_passes_all_phases() {
    let executor = ScriptedExecutor::new(START)
        .then(ScriptedStep::ok_at(GITHUB_LOGIN))
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok_at(DASHBOARD))
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok());
    let proposer = MockProposer::new().with_fallback(click());

    let mut controller = FlowController::new(flow(), executor, proposer, verifier(), config());
    let report = controller.run().await;

    assert_eq!(report.status, AttemptStatus::Passed);
    assert!(report.phase_reached.is_none());
    assert_eq!(report.history.len(), 4);
    assert!(report.history.iter().all(|event| event.success));
    assert_eq!(report.history[0].actions_performed, 1);
    assert_eq!(report.history[1].actions_performed, 3);
    assert_eq!(controller.executor().executed().len(), 6);
    assert!(controller.executor().is_closed());
}

/// Blocker short-circuit: the callback URL carries an account-not-linked
/// marker, so the attempt terminates with a blocker-specific message
/// without consuming the phase's ordinary retry budget.
#[tokio::test]
async fn scenario_blocker_short_circuits_without_retries() {
    let executor = ScriptedExecutor::new(START)
        .then(ScriptedStep::ok_at(GITHUB_LOGIN))
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok_at(LINK_ERROR))
        .then(ScriptedStep::ok());
    let proposer = MockProposer::new().with_fallback(click());

    let mut controller = FlowController::new(flow(), executor, proposer, verifier(), config());
    let report = controller.run().await;

    assert_eq!(report.status, AttemptStatus::Blocked);
    assert!(report.message.contains("account-linking"));
    assert_eq!(report.phase_reached.as_deref(), Some(names::CALLBACK));
    // Only the two advances are in history; no retry-exhaustion entry.
    assert_eq!(report.history.len(), 2);
    assert!(report.history.iter().all(|event| event.success));
    assert!(controller.executor().is_closed());
}

/// Runaway guard: provider_auth never returns home, so the attempt fails
/// with an exceeded-max-actions reason, not retry exhaustion.
#[tokio::test]
async fn scenario_runaway_guard_trips_on_action_budget() {
    let executor = ScriptedExecutor::new(START).then(ScriptedStep::ok_at(GITHUB_LOGIN));
    let proposer = MockProposer::new().with_fallback(click());

    let mut controller = FlowController::new(flow(), executor, proposer, verifier(), config());
    let report = controller.run().await;

    assert_eq!(report.status, AttemptStatus::Failed);
    assert!(report.message.contains("exceeded max actions"));
    assert!(!report.message.contains("retry"));
    assert_eq!(report.phase_reached.as_deref(), Some(names::PROVIDER_AUTH));
    assert_eq!(report.actions_in_final_phase, 10);
    assert!(controller.executor().is_closed());
}

/// Proposer stall: three consecutive null proposals exhaust the retry
/// budget with zero actions executed or recorded.
#[tokio::test]
async fn scenario_proposer_stall_fails_without_actions() {
    let executor = ScriptedExecutor::new(START);
    let proposer = MockProposer::new().then(None).then(None).then(None);

    let mut controller = FlowController::new(flow(), executor, proposer, verifier(), config());
    let report = controller.run().await;

    assert_eq!(report.status, AttemptStatus::Failed);
    assert!(report.message.contains("no action"));
    assert_eq!(report.actions_in_final_phase, 0);
    assert!(controller.executor().executed().is_empty());
    assert!(controller.executor().is_closed());
}

/// Repeated execution failures consume the retry budget and fail the
/// attempt without ever counting an action.
#[tokio::test]
async fn repeated_action_failures_exhaust_retries() {
    let executor = ScriptedExecutor::new(START)
        .then(ScriptedStep::fails("element not interactable"))
        .then(ScriptedStep::fails("element not interactable"))
        .then(ScriptedStep::fails("element not interactable"));
    let proposer = MockProposer::new().with_fallback(click());

    let mut controller = FlowController::new(flow(), executor, proposer, verifier(), config());
    let report = controller.run().await;

    assert_eq!(report.status, AttemptStatus::Failed);
    assert!(report.message.contains("kept failing"));
    assert_eq!(report.actions_in_final_phase, 0);
}

struct AccountLinker;

#[async_trait]
impl Remediator for AccountLinker {
    async fn diagnose(&self, context: &DiagnosticContext) -> Result<Diagnostic, RemediationError> {
        Ok(Diagnostic {
            root_cause: "OAuth account not linked to an existing user".to_string(),
            confidence: 0.9,
            evidence: vec![context.page_url.clone()],
            fix_suggestions: vec!["link the provider account".to_string()],
        })
    }

    async fn propose_fix(&self, _diagnostic: &Diagnostic) -> Result<FixPlan, RemediationError> {
        Ok(FixPlan {
            changes: vec![FixChange {
                target: "accounts.user_links".to_string(),
                description: "insert provider link row".to_string(),
            }],
            risk: RiskLevel::Low,
            requires_approval: false,
            summary: "link github account to user".to_string(),
        })
    }

    async fn apply_fix(
        &self,
        plan: &FixPlan,
        _approved: bool,
    ) -> Result<FixOutcome, RemediationError> {
        Ok(FixOutcome {
            successful: plan.changes.iter().map(|c| c.target.clone()).collect(),
            failed: Vec::new(),
        })
    }
}

/// A remediated blocker resets the tracker and proposer memory, replays
/// the flow from the first phase, and the second pass can complete.
#[tokio::test]
async fn remediation_restart_replays_flow_to_success() {
    let executor = ScriptedExecutor::new(START)
        // Pass 1: blocker at the callback.
        .then(ScriptedStep::ok_at(GITHUB_LOGIN))
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok_at(LINK_ERROR))
        .then(ScriptedStep::ok())
        // Restart navigation back to the start URL.
        .then(ScriptedStep::ok())
        // Pass 2: clean run.
        .then(ScriptedStep::ok_at(GITHUB_LOGIN))
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok_at(DASHBOARD))
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok());
    let proposer = MockProposer::new().with_fallback(click());

    let mut controller =
        FlowController::new(flow(), executor, proposer, verifier(), config().auto_fix(true))
            .with_remediator(Arc::new(AccountLinker));
    let report = controller.run().await;

    assert_eq!(report.status, AttemptStatus::Passed);
    // History was reset on restart: only the clean pass remains.
    assert_eq!(report.history.len(), 4);
    assert_eq!(controller.proposer().resets(), 1);
    assert!(controller.executor().is_closed());
}

/// The restart cap bounds remediation cycles: with a cap of zero the
/// first applied fix aborts the attempt instead of looping.
#[tokio::test]
async fn restart_cap_bounds_remediation_cycles() {
    let executor = ScriptedExecutor::new(START)
        .then(ScriptedStep::ok_at(GITHUB_LOGIN))
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok())
        .then(ScriptedStep::ok_at(LINK_ERROR))
        .then(ScriptedStep::ok());
    let proposer = MockProposer::new().with_fallback(click());

    let mut controller = FlowController::new(
        flow(),
        executor,
        proposer,
        verifier(),
        config().auto_fix(true).restarts(0),
    )
    .with_remediator(Arc::new(AccountLinker));
    let report = controller.run().await;

    assert_eq!(report.status, AttemptStatus::Aborted);
    assert!(report.message.contains("restart cap"));
    assert!(controller.executor().is_closed());
}
