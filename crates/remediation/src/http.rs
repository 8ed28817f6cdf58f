//! HTTP client for a diagnostics/fix sidecar.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as Base64;
use base64::Engine as _;
use serde::Serialize;

use crate::{
    Diagnostic, DiagnosticContext, FixOutcome, FixPlan, RemediationError, Remediator,
};

#[derive(Serialize)]
struct DiagnoseRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    screenshot_base64: Option<String>,
    error_info: &'a str,
    network_logs: &'a [String],
    page_url: &'a str,
}

#[derive(Serialize)]
struct ApplyRequest<'a> {
    plan: &'a FixPlan,
    approved: bool,
}

/// [`Remediator`] backed by a diagnostics sidecar speaking JSON over HTTP.
pub struct HttpRemediator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemediator {
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
impl Remediator for HttpRemediator {
    async fn diagnose(&self, context: &DiagnosticContext) -> Result<Diagnostic, RemediationError> {
        let request = DiagnoseRequest {
            screenshot_base64: context.screenshot.as_deref().map(|s| Base64.encode(s)),
            error_info: &context.error_info,
            network_logs: &context.network_logs,
            page_url: &context.page_url,
        };
        let response = self
            .client
            .post(self.endpoint("diagnose"))
            .json(&request)
            .send()
            .await
            .map_err(|err| RemediationError::Diagnosis(err.to_string()))?;
        response
            .json()
            .await
            .map_err(|err| RemediationError::Diagnosis(err.to_string()))
    }

    async fn propose_fix(&self, diagnostic: &Diagnostic) -> Result<FixPlan, RemediationError> {
        let response = self
            .client
            .post(self.endpoint("propose-fix"))
            .json(diagnostic)
            .send()
            .await
            .map_err(|err| RemediationError::Planning(err.to_string()))?;
        response
            .json()
            .await
            .map_err(|err| RemediationError::Planning(err.to_string()))
    }

    async fn apply_fix(
        &self,
        plan: &FixPlan,
        approved: bool,
    ) -> Result<FixOutcome, RemediationError> {
        let request = ApplyRequest { plan, approved };
        let response = self
            .client
            .post(self.endpoint("apply-fix"))
            .json(&request)
            .send()
            .await
            .map_err(|err| RemediationError::Application(err.to_string()))?;
        response
            .json()
            .await
            .map_err(|err| RemediationError::Application(err.to_string()))
    }
}
