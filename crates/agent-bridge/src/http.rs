//! HTTP client for a vision-agent sidecar.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as Base64;
use base64::Engine as _;
use browser_actions::{ActionOutcome, BrowserAction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ProposerError;
use crate::memory::{ConversationMemory, MemoryKind};
use crate::proposer::{ActionProposer, ProposalContext};

#[derive(Serialize)]
struct ProposeRequest<'a> {
    screenshot_base64: String,
    goal: &'a str,
    context: &'a ProposalContext,
}

#[derive(Deserialize)]
struct ProposeResponse {
    /// Proposed action payload; null when the agent cannot decide.
    action: Option<Value>,
}

#[derive(Serialize)]
struct OutcomeReport<'a> {
    outcome: &'a ActionOutcome,
    current_url: &'a str,
}

/// [`ActionProposer`] backed by an agent sidecar speaking JSON over HTTP.
///
/// The sidecar holds the multi-turn model conversation; this client keeps a
/// bounded local mirror of it for diagnostics and mirrors resets to the
/// sidecar so both sides start attempts clean.
pub struct HttpProposer {
    base_url: String,
    client: reqwest::Client,
    memory: ConversationMemory,
}

impl HttpProposer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            memory: ConversationMemory::default(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ActionProposer for HttpProposer {
    async fn propose(
        &mut self,
        screenshot: &[u8],
        goal: &str,
        context: &ProposalContext,
    ) -> Result<Option<BrowserAction>, ProposerError> {
        let request = ProposeRequest {
            screenshot_base64: Base64.encode(screenshot),
            goal,
            context,
        };

        let response = self
            .client
            .post(self.endpoint("propose"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProposerError::Transport(format!(
                "agent endpoint returned {}",
                response.status()
            )));
        }

        let body: ProposeResponse = response
            .json()
            .await
            .map_err(|err| ProposerError::InvalidResponse(err.to_string()))?;

        self.memory
            .push(MemoryKind::Goal, format!("[{}] {}", context.phase, goal));

        match body.action {
            None => Ok(None),
            Some(payload) => {
                let action = BrowserAction::from_value(payload)
                    .map_err(|err| ProposerError::InvalidResponse(err.to_string()))?;
                action
                    .validate()
                    .map_err(|err| ProposerError::InvalidResponse(err.to_string()))?;
                self.memory.push(MemoryKind::Action, action.name());
                debug!(action = action.name(), phase = %context.phase, "agent proposed action");
                Ok(Some(action))
            }
        }
    }

    async fn report_outcome(&mut self, outcome: &ActionOutcome, current_url: &str) {
        self.memory.push(
            MemoryKind::Outcome,
            format!(
                "{} {} -> {}",
                outcome.action,
                if outcome.success { "ok" } else { "failed" },
                current_url
            ),
        );

        let report = OutcomeReport {
            outcome,
            current_url,
        };
        if let Err(err) = self
            .client
            .post(self.endpoint("outcome"))
            .json(&report)
            .send()
            .await
        {
            warn!(?err, "failed to report action outcome to agent");
        }
    }

    async fn reset_memory(&mut self) {
        self.memory.clear();
        if let Err(err) = self.client.post(self.endpoint("reset")).send().await {
            warn!(?err, "failed to reset agent memory");
        }
    }
}
