//! The driver seam: how the flow core talks to a live browser.

use async_trait::async_trait;

use crate::errors::CaptureError;
use crate::types::{ActionOutcome, BrowserAction, PageState};

/// Executes typed actions against a live browser page.
///
/// Implementations own the underlying page/session exclusively for the
/// duration of one attempt. Expected action-level failures are reported via
/// [`ActionOutcome::success`]; `execute` does not fail at the call level.
/// [`ActionExecutor::capture_state`] may return
/// [`CaptureError::Navigating`] transiently while a redirect is in flight;
/// callers retry once after a short delay.
#[async_trait]
pub trait ActionExecutor: Send {
    /// Capture the current page state (screenshot, URL, title).
    async fn capture_state(&mut self) -> Result<PageState, CaptureError>;

    /// Execute one action and report its observable result.
    async fn execute(&mut self, action: &BrowserAction) -> ActionOutcome;

    /// Current page URL without a full state capture.
    async fn current_url(&mut self) -> Result<String, CaptureError>;

    /// Tear down the underlying browser session.
    ///
    /// Called exactly once on every attempt exit path.
    async fn close(&mut self);
}
