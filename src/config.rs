//! Application configuration.
//!
//! Loaded from a YAML file; policy constants (action/retry ceilings,
//! provider_auth action threshold, settle delays) are configuration
//! rather than literals so per-provider tuning never touches control-flow
//! code. Credentials are resolved from environment variables named here.

use std::collections::HashSet;
use std::env;
use std::time::Duration;

use agent_bridge::Credentials;
use flow_engine::{FlowConfig, PhaseSpec, VerifyPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("provider '{provider}': {problem}")]
    Invalid { provider: String, problem: String },

    #[error("credential environment variable {0} is not set")]
    MissingCredential(String),
}

/// Top-level configuration file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Flow budgets shared by all providers.
    pub flow: FlowConfig,

    /// Browser-driver sidecar.
    pub driver: DriverSettings,

    /// Vision-agent sidecar.
    pub agent: AgentSettings,

    /// Diagnostics/fix sidecar, when one is deployed.
    pub remediation: RemediationSettings,

    /// Providers to test.
    pub providers: Vec<ProviderSettings>,
}

impl AppConfig {
    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Validate the whole config, reporting every problem at once.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();
        for provider in &self.providers {
            if !seen.insert(provider.name.as_str()) {
                problems.push(format!("duplicate provider name '{}'", provider.name));
            }
            for problem in provider.validate() {
                problems.push(format!("provider '{}': {problem}", provider.name));
            }
        }
        problems
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Base URL of the browser-driver sidecar.
    pub endpoint: String,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:4723".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Base URL of the vision-agent sidecar.
    pub endpoint: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8930".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationSettings {
    /// Base URL of the diagnostics sidecar; remediation is disabled when
    /// unset.
    pub endpoint: Option<String>,
}

/// One provider's flow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider name, e.g. "github".
    pub name: String,

    /// URL the flow starts from.
    pub start_url: String,

    /// Domain of the home (relying) application.
    pub home_domain: String,

    /// Domain token of the identity provider.
    pub provider_domain: String,

    /// Override for the provider_auth minimum-action threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_provider_auth_actions: Option<u32>,

    /// Phase sequence; the standard landing → provider_auth → callback →
    /// dashboard progression when omitted.
    #[serde(default)]
    pub phases: Vec<PhaseSettings>,

    /// Where to find this provider's login credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSettings {
    pub name: String,

    /// Override of the phase's post-action settle delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSettings {
    pub username_env: String,
    pub password_env: String,
}

impl ProviderSettings {
    /// Phase sequence as flow-engine specs.
    pub fn phase_specs(&self) -> Vec<PhaseSpec> {
        if self.phases.is_empty() {
            return vec![
                PhaseSpec::new(flow_engine::names::LANDING),
                PhaseSpec::new(flow_engine::names::PROVIDER_AUTH),
                PhaseSpec::new(flow_engine::names::CALLBACK),
                PhaseSpec::new(flow_engine::names::DASHBOARD),
            ];
        }
        self.phases
            .iter()
            .map(|phase| {
                let spec = PhaseSpec::new(&phase.name);
                match phase.settle_delay_ms {
                    Some(ms) => spec.with_settle_delay(Duration::from_millis(ms)),
                    None => spec,
                }
            })
            .collect()
    }

    /// Verification policy for this provider.
    pub fn verify_policy(&self) -> VerifyPolicy {
        let mut policy = VerifyPolicy::for_domains(&self.home_domain, &self.provider_domain);
        if let Some(min) = self.min_provider_auth_actions {
            policy.min_provider_auth_actions = min;
        }
        policy
    }

    /// Resolve credentials from the configured environment variables.
    pub fn resolve_credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        let Some(settings) = &self.credentials else {
            return Ok(None);
        };
        let username = env::var(&settings.username_env)
            .map_err(|_| ConfigError::MissingCredential(settings.username_env.clone()))?;
        let password = env::var(&settings.password_env)
            .map_err(|_| ConfigError::MissingCredential(settings.password_env.clone()))?;
        Ok(Some(Credentials { username, password }))
    }

    fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.is_empty() {
            problems.push("name must not be empty".to_string());
        }
        if self.start_url.is_empty() {
            problems.push("start_url must not be empty".to_string());
        }
        if self.home_domain.is_empty() {
            problems.push("home_domain must not be empty".to_string());
        }
        if self.provider_domain.is_empty() {
            problems.push("provider_domain must not be empty".to_string());
        }
        let mut seen = HashSet::new();
        for phase in &self.phases {
            if !seen.insert(phase.name.as_str()) {
                problems.push(format!("phase '{}' repeats in the sequence", phase.name));
            }
        }
        if let Some(0) = self.min_provider_auth_actions {
            problems.push("min_provider_auth_actions must be at least 1".to_string());
        }
        if let Some(credentials) = &self.credentials {
            if credentials.username_env.is_empty() || credentials.password_env.is_empty() {
                problems.push("credential environment variable names must not be empty".to_string());
            }
        }
        problems
    }
}
