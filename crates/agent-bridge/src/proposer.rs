//! The proposer seam: how the flow core asks the vision agent for actions.

use std::fmt;

use async_trait::async_trait;
use authpilot_core_types::ProviderId;
use browser_actions::{ActionOutcome, BrowserAction};
use serde::{Deserialize, Serialize};

use crate::errors::ProposerError;

/// Login credentials handed to the proposer for form-fill phases.
///
/// The password never appears in `Debug` output or logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Context accompanying each proposal request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalContext {
    /// Provider under test.
    pub provider: ProviderId,

    /// Name of the logical phase the flow is currently in.
    pub phase: String,

    /// Current page URL.
    pub url: String,

    /// Credentials, when the current phase needs a form fill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

/// Proposes one UI action per request from a screenshot and a goal.
///
/// Implementations maintain their own multi-turn memory; `report_outcome`
/// feeds the ground-truth result of the previous action back into it, and
/// `reset_memory` clears it between independent attempts.
#[async_trait]
pub trait ActionProposer: Send {
    /// Propose the next action, or `Ok(None)` when the agent cannot decide.
    ///
    /// Errors are reserved for transport/API failures.
    async fn propose(
        &mut self,
        screenshot: &[u8],
        goal: &str,
        context: &ProposalContext,
    ) -> Result<Option<BrowserAction>, ProposerError>;

    /// Report the executed action's outcome and the resulting URL.
    ///
    /// Best-effort: failures are logged by implementations, never surfaced.
    async fn report_outcome(&mut self, outcome: &ActionOutcome, current_url: &str);

    /// Clear multi-turn memory for a fresh attempt.
    async fn reset_memory(&mut self);
}
