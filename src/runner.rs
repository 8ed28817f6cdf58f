//! Multi-provider batch runner.
//!
//! Each provider gets a fresh tracker, proposer memory and browser
//! session; one provider's failure is converted into a structured report
//! and never aborts the rest of the batch.

use std::path::PathBuf;
use std::sync::Arc;

use agent_bridge::{ActionProposer, HttpProposer, MockProposer};
use authpilot_core_types::{AttemptId, ProviderId};
use browser_actions::{ActionExecutor, BrowserAction, ScriptedExecutor, ScriptedStep};
use chrono::Utc;
use flow_engine::{
    names, AttemptReport, AttemptStatus, FlowController, FlowVerifier, ProviderFlow,
};
use remediation::{HttpRemediator, Remediator};
use tracing::{info, warn};

use crate::config::{AppConfig, ProviderSettings};
use crate::drivers::HttpExecutor;

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Restrict the batch to one provider.
    pub only: Option<String>,

    /// Use scripted in-process doubles instead of the sidecars.
    pub dry_run: bool,

    /// Apply proposed remediations automatically.
    pub auto_fix: bool,

    /// Directory attempt reports are written to.
    pub report_dir: PathBuf,
}

/// Run the configured providers sequentially, one attempt each.
pub async fn run_providers(config: &AppConfig, options: &RunOptions) -> Vec<AttemptReport> {
    let mut reports = Vec::new();
    for provider in &config.providers {
        if let Some(only) = &options.only {
            if &provider.name != only {
                continue;
            }
        }
        info!(provider = %provider.name, dry_run = options.dry_run, "running provider flow");
        reports.push(run_one(config, provider, options).await);
    }
    reports
}

async fn run_one(
    config: &AppConfig,
    provider: &ProviderSettings,
    options: &RunOptions,
) -> AttemptReport {
    let credentials = if options.dry_run {
        provider.resolve_credentials().ok().flatten()
    } else {
        match provider.resolve_credentials() {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!(provider = %provider.name, %err, "cannot run provider");
                return config_failure(provider, err.to_string());
            }
        }
    };

    let flow = ProviderFlow {
        provider: ProviderId::new(&provider.name),
        start_url: provider.start_url.clone(),
        phases: provider.phase_specs(),
        credentials,
    };
    let verifier = FlowVerifier::new(provider.verify_policy());
    let mut flow_config = config.flow.clone();
    flow_config.auto_apply_fixes = options.auto_fix;

    let remediator: Option<Arc<dyn Remediator>> = config
        .remediation
        .endpoint
        .as_ref()
        .map(|endpoint| Arc::new(HttpRemediator::new(endpoint)) as Arc<dyn Remediator>);

    if options.dry_run {
        let executor = scripted_happy_path(provider, &verifier);
        let proposer = MockProposer::new().with_fallback(BrowserAction::ClickAt { x: 500, y: 400 });
        drive(flow, executor, proposer, verifier, flow_config, remediator).await
    } else {
        let executor = HttpExecutor::new(&config.driver.endpoint);
        let proposer = HttpProposer::new(&config.agent.endpoint);
        drive(flow, executor, proposer, verifier, flow_config, remediator).await
    }
}

async fn drive<E, P>(
    flow: ProviderFlow,
    executor: E,
    proposer: P,
    verifier: FlowVerifier,
    flow_config: flow_engine::FlowConfig,
    remediator: Option<Arc<dyn Remediator>>,
) -> AttemptReport
where
    E: ActionExecutor,
    P: ActionProposer,
{
    let mut controller = FlowController::new(flow, executor, proposer, verifier, flow_config);
    if let Some(remediator) = remediator {
        controller = controller.with_remediator(remediator);
    }
    controller.run().await
}

/// Scripted URL timeline that satisfies each phase's exit condition, so a
/// dry run exercises the full control loop without a browser.
fn scripted_happy_path(provider: &ProviderSettings, verifier: &FlowVerifier) -> ScriptedExecutor {
    let home = &provider.home_domain;
    let provider_login = format!("https://{}/login", provider.provider_domain);
    let authenticated = format!("https://{home}/dashboard");
    let signin = format!("https://{home}/signin");
    let min_auth_actions = verifier.policy().min_provider_auth_actions.max(1);

    let mut executor = ScriptedExecutor::new(&provider.start_url);
    for phase in provider.phase_specs() {
        match phase.name.as_str() {
            names::LANDING => {
                executor = executor.then(ScriptedStep::ok_at(&provider_login));
            }
            names::PROVIDER_AUTH => {
                for _ in 1..min_auth_actions {
                    executor = executor.then(ScriptedStep::ok());
                }
                executor = executor.then(ScriptedStep::ok_at(&authenticated));
            }
            names::SIGNOUT => {
                executor = executor.then(ScriptedStep::ok_at(&signin));
            }
            // email_login, callback, dashboard and custom phases verify in
            // place on the home domain.
            _ => {
                executor = executor.then(ScriptedStep::ok());
            }
        }
    }
    executor
}

fn config_failure(provider: &ProviderSettings, message: String) -> AttemptReport {
    let now = Utc::now();
    AttemptReport {
        attempt_id: AttemptId::new(),
        provider: ProviderId::new(&provider.name),
        status: AttemptStatus::Failed,
        message,
        phase_reached: provider.phase_specs().first().map(|p| p.name.clone()),
        actions_in_final_phase: 0,
        history: Vec::new(),
        started_at: now,
        finished_at: now,
        duration_ms: 0,
    }
}
