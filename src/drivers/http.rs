//! HTTP client for the browser-driver sidecar.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as Base64;
use base64::Engine as _;
use browser_actions::{ActionExecutor, ActionOutcome, BrowserAction, CaptureError, PageState};
use serde::Deserialize;
use tracing::warn;

#[derive(Deserialize)]
struct StateResponse {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    screenshot_base64: String,
    /// Set while a navigation is in flight.
    #[serde(default)]
    navigating: bool,
}

#[derive(Deserialize)]
struct UrlResponse {
    url: String,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// [`ActionExecutor`] backed by a driver sidecar speaking JSON over HTTP.
///
/// The sidecar owns the actual browser process; navigation timeouts live
/// there and surface here as failed action outcomes.
pub struct HttpExecutor {
    base_url: String,
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ActionExecutor for HttpExecutor {
    async fn capture_state(&mut self) -> Result<PageState, CaptureError> {
        let response = self
            .client
            .get(self.endpoint("state"))
            .send()
            .await
            .map_err(|err| CaptureError::Failed(err.to_string()))?;
        let body: StateResponse = response
            .json()
            .await
            .map_err(|err| CaptureError::Failed(err.to_string()))?;

        if body.navigating {
            return Err(CaptureError::Navigating);
        }

        let screenshot = Base64
            .decode(body.screenshot_base64.as_bytes())
            .map_err(|err| CaptureError::Failed(format!("invalid screenshot payload: {err}")))?;
        Ok(PageState {
            url: body.url,
            title: body.title,
            screenshot,
        })
    }

    async fn execute(&mut self, action: &BrowserAction) -> ActionOutcome {
        if let Err(err) = action.validate() {
            return ActionOutcome::failed(action, err.to_string());
        }

        let request = self.client.post(self.endpoint("action")).json(action);
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                return ActionOutcome::failed(action, format!("driver transport failure: {err}"))
            }
        };
        match response.json::<ExecuteResponse>().await {
            Ok(body) => ActionOutcome {
                success: body.success,
                action: action.name().to_string(),
                error: body.error,
                args: serde_json::to_value(action).unwrap_or(serde_json::Value::Null),
            },
            Err(err) => ActionOutcome::failed(action, format!("malformed driver response: {err}")),
        }
    }

    async fn current_url(&mut self) -> Result<String, CaptureError> {
        let response = self
            .client
            .get(self.endpoint("url"))
            .send()
            .await
            .map_err(|err| CaptureError::Failed(err.to_string()))?;
        let body: UrlResponse = response
            .json()
            .await
            .map_err(|err| CaptureError::Failed(err.to_string()))?;
        Ok(body.url)
    }

    async fn close(&mut self) {
        if let Err(err) = self.client.post(self.endpoint("session/close")).send().await {
            warn!(?err, "failed to close driver session");
        }
    }
}
