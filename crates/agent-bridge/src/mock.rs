//! Deterministic proposer double for tests and dry runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use browser_actions::{ActionOutcome, BrowserAction};

use crate::errors::ProposerError;
use crate::memory::{ConversationMemory, MemoryKind};
use crate::proposer::{ActionProposer, ProposalContext};

/// Scripted [`ActionProposer`].
///
/// Pops one scripted response per `propose` call; `None` entries simulate
/// the agent declining to act. When the script is exhausted the fallback
/// action (if any) is repeated.
#[derive(Debug, Default)]
pub struct MockProposer {
    script: VecDeque<Option<BrowserAction>>,
    fallback: Option<BrowserAction>,
    memory: ConversationMemory,
    resets: u32,
}

impl MockProposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scripted response.
    pub fn then(mut self, action: Option<BrowserAction>) -> Self {
        self.script.push_back(action);
        self
    }

    /// Action repeated once the script runs out.
    pub fn with_fallback(mut self, action: BrowserAction) -> Self {
        self.fallback = Some(action);
        self
    }

    /// Number of memory resets observed (one per attempt restart).
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Remembered turns, for assertions.
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }
}

#[async_trait]
impl ActionProposer for MockProposer {
    async fn propose(
        &mut self,
        _screenshot: &[u8],
        goal: &str,
        context: &ProposalContext,
    ) -> Result<Option<BrowserAction>, ProposerError> {
        self.memory
            .push(MemoryKind::Goal, format!("[{}] {}", context.phase, goal));

        let proposed = match self.script.pop_front() {
            Some(entry) => entry,
            None => self.fallback.clone(),
        };
        if let Some(action) = &proposed {
            self.memory.push(MemoryKind::Action, action.name());
        }
        Ok(proposed)
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
    }

    async fn reset_memory(&mut self) {
        self.memory.clear();
        self.resets += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authpilot_core_types::ProviderId;

    fn context() -> ProposalContext {
        ProposalContext {
            provider: ProviderId::from("github"),
            phase: "landing".to_string(),
            url: "https://app.test".to_string(),
            credentials: None,
        }
    }

    #[tokio::test]
    async fn replays_script_then_fallback() {
        let mut proposer = MockProposer::new()
            .then(Some(BrowserAction::ClickAt { x: 1, y: 1 }))
            .then(None)
            .with_fallback(BrowserAction::GoBack);

        let ctx = context();
        assert!(matches!(
            proposer.propose(&[], "click", &ctx).await.unwrap(),
            Some(BrowserAction::ClickAt { .. })
        ));
        assert!(proposer.propose(&[], "decide", &ctx).await.unwrap().is_none());
        assert!(matches!(
            proposer.propose(&[], "anything", &ctx).await.unwrap(),
            Some(BrowserAction::GoBack)
        ));
    }

    #[tokio::test]
    async fn reset_clears_memory_and_counts() {
        let mut proposer = MockProposer::new().with_fallback(BrowserAction::GoBack);
        let _ = proposer.propose(&[], "goal", &context()).await.unwrap();
        assert!(!proposer.memory().is_empty());

        proposer.reset_memory().await;
        assert!(proposer.memory().is_empty());
        assert_eq!(proposer.resets(), 1);
    }
}
