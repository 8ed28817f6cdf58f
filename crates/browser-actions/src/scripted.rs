//! Deterministic executor double for tests and dry runs.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::errors::CaptureError;
use crate::executor::ActionExecutor;
use crate::types::{ActionOutcome, BrowserAction, PageState};

/// One scripted execution step.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStep {
    /// Error to report for this action; `None` means success.
    pub error: Option<String>,

    /// URL the page lands on after this action, if it changes.
    pub url_after: Option<String>,
}

impl ScriptedStep {
    /// Step that succeeds without changing the URL.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Step that succeeds and leaves the page at `url`.
    pub fn ok_at(url: impl Into<String>) -> Self {
        Self {
            error: None,
            url_after: Some(url.into()),
        }
    }

    /// Step that fails with the given error.
    pub fn fails(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            url_after: None,
        }
    }
}

/// In-memory [`ActionExecutor`] that replays a scripted URL timeline.
///
/// Steps are consumed one per executed action; once the script is
/// exhausted, further actions succeed without moving the page.
#[derive(Debug)]
pub struct ScriptedExecutor {
    url: String,
    title: Option<String>,
    script: VecDeque<ScriptedStep>,
    executed: Vec<BrowserAction>,
    closed: bool,
}

impl ScriptedExecutor {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            url: start_url.into(),
            title: None,
            script: VecDeque::new(),
            executed: Vec::new(),
            closed: false,
        }
    }

    /// Append a scripted step.
    pub fn then(mut self, step: ScriptedStep) -> Self {
        self.script.push_back(step);
        self
    }

    /// Actions executed so far, in order.
    pub fn executed(&self) -> &[BrowserAction] {
        &self.executed
    }

    /// Whether the session was torn down.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Current scripted URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ActionExecutor for ScriptedExecutor {
    async fn capture_state(&mut self) -> Result<PageState, CaptureError> {
        Ok(PageState {
            url: self.url.clone(),
            title: self.title.clone(),
            screenshot: Vec::new(),
        })
    }

    async fn execute(&mut self, action: &BrowserAction) -> ActionOutcome {
        self.executed.push(action.clone());

        // Scripted navigation overrides the step's url_after.
        if let BrowserAction::Navigate { url } = action {
            self.url = url.clone();
        }

        let step = self.script.pop_front().unwrap_or_default();
        if let Some(url) = step.url_after {
            self.url = url;
        }
        match step.error {
            Some(error) => ActionOutcome::failed(action, error),
            None => ActionOutcome::ok(action),
        }
    }

    async fn current_url(&mut self) -> Result<String, CaptureError> {
        Ok(self.url.clone())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
