//! URL-based phase exit verification.
//!
//! The URL is the only agent-independent signal of real progress: the
//! proposer's self-report is unverified and screenshots can lie about
//! focus state. Each phase has a known exit shape, checked here as a pure
//! function of (phase name, URL, per-phase action count).

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::phases::names;

/// Outcome of verifying a phase's exit condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    /// The phase's goal is achieved; advance to the next phase.
    Advance,

    /// Expected mid-phase state; keep acting, no retry cost.
    Wait,

    /// A condition ordinary retries can never resolve: either it needs
    /// out-of-band action (email verification) or a server-side fix
    /// (account linking). Must short-circuit the retry loop.
    BlockerError,

    /// The phase did not verify; consumes one retry.
    Fail,
}

/// Verification result with a human-readable reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub reason: String,
}

impl Verdict {
    fn advance(reason: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Advance,
            reason: reason.into(),
        }
    }

    fn wait(reason: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Wait,
            reason: reason.into(),
        }
    }

    fn blocker(reason: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::BlockerError,
            reason: reason.into(),
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Fail,
            reason: reason.into(),
        }
    }
}

/// Per-provider verification policy.
///
/// Thresholds and URL markers are configuration, not literals: they were
/// tuned against specific provider login UIs and other providers' forms
/// may need different values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPolicy {
    /// Domain of the home (relying) application, e.g. "app.example.com".
    pub home_domain: String,

    /// Domain token identifying the identity provider, e.g. "github.com".
    pub provider_domain: String,

    /// Minimum actions before `provider_auth` may advance: identifier
    /// entry, password entry, submit.
    pub min_provider_auth_actions: u32,

    /// Query markers of OAuth callback errors that are server-side/data
    /// conditions rather than automation failures.
    pub oauth_error_markers: Vec<String>,

    /// Path fragments of sign-in pages on the home domain.
    pub signin_paths: Vec<String>,

    /// Path fragments of "check your email" pages.
    pub verification_paths: Vec<String>,

    /// Path fragments of the authenticated area.
    pub authenticated_paths: Vec<String>,
}

impl VerifyPolicy {
    /// Policy with stock markers for the given domain pair.
    pub fn for_domains(home: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            home_domain: home.into(),
            provider_domain: provider.into(),
            min_provider_auth_actions: 3,
            oauth_error_markers: vec![
                "error=OAuthAccountNotLinked".to_string(),
                "error=OAuthCallback".to_string(),
                "error=OAuthSignin".to_string(),
                "error=Callback".to_string(),
                "error=AccessDenied".to_string(),
            ],
            signin_paths: vec![
                "/signin".to_string(),
                "/sign-in".to_string(),
                "/login".to_string(),
                "/auth/signin".to_string(),
            ],
            verification_paths: vec![
                "/verify-request".to_string(),
                "/verify-email".to_string(),
                "/check-email".to_string(),
            ],
            authenticated_paths: vec![
                "/dashboard".to_string(),
                "/keys".to_string(),
                "/api-keys".to_string(),
                "/settings".to_string(),
                "/profile".to_string(),
                "/account".to_string(),
            ],
        }
    }
}

/// Decides whether a phase's exit condition is satisfied.
#[derive(Debug, Clone)]
pub struct FlowVerifier {
    policy: VerifyPolicy,
}

impl FlowVerifier {
    pub fn new(policy: VerifyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &VerifyPolicy {
        &self.policy
    }

    /// Verify the current phase against the observed URL.
    ///
    /// Pure: identical inputs yield identical verdicts and nothing is
    /// mutated, so the controller may call it freely.
    pub fn verify(
        &self,
        phase: &str,
        current_url: &str,
        actions_in_phase: u32,
        max_actions_per_phase: u32,
    ) -> Verdict {
        match phase {
            names::LANDING => self.verify_landing(current_url),
            names::EMAIL_LOGIN => self.verify_email_login(current_url),
            names::PROVIDER_AUTH => {
                self.verify_provider_auth(current_url, actions_in_phase, max_actions_per_phase)
            }
            names::CALLBACK => self.verify_callback(current_url),
            names::DASHBOARD => self.verify_dashboard(current_url),
            names::SIGNOUT => self.verify_signout(current_url),
            other => {
                // Fail open: an unrecognized phase must never silently
                // block a hand-authored flow, but it should be visible.
                warn!(phase = other, "unknown phase name in flow; advancing");
                Verdict::advance(format!("unrecognized phase '{other}' treated as complete"))
            }
        }
    }

    /// Landing tolerates a single action: either the home app is still
    /// current (provider button clicked, redirect pending) or the provider
    /// domain is already showing.
    fn verify_landing(&self, url: &str) -> Verdict {
        if self.on_provider(url) {
            return Verdict::advance(format!("reached provider domain {}", self.policy.provider_domain));
        }
        if self.on_home(url) {
            return Verdict::advance("still on home application; provider redirect pending");
        }
        Verdict::wait(format!("expected {} or {}, at {url}", self.policy.home_domain, self.policy.provider_domain))
    }

    /// A "check your email" URL can never resolve without mailbox access,
    /// so it must not burn retries.
    fn verify_email_login(&self, url: &str) -> Verdict {
        if self.path_matches(url, &self.policy.verification_paths) {
            return Verdict::blocker(
                "email verification pending: the flow cannot proceed without access to the \
                 verification email; complete it manually or switch the provider to OAuth",
            );
        }
        if self.on_home(url) {
            return Verdict::advance("email login form handled on home domain");
        }
        Verdict::wait(format!("expected home domain {}, at {url}", self.policy.home_domain))
    }

    /// The critical multi-action phase. A single click on the provider's
    /// login page leaves the URL on the provider domain, and a stray
    /// redirect can make the URL look home-bound before credentials are
    /// even entered, so below the action threshold the verdict is WAIT
    /// regardless of URL. At or above it, only a URL back on the home
    /// domain counts as the completed OAuth exchange.
    fn verify_provider_auth(&self, url: &str, actions: u32, max_actions: u32) -> Verdict {
        let min = self.policy.min_provider_auth_actions;
        if actions < min {
            return Verdict::wait(format!(
                "provider form fill in progress: {actions} of at least {min} actions"
            ));
        }
        if self.on_home(url) {
            return Verdict::advance(format!(
                "returned to {} after {actions} provider actions",
                self.policy.home_domain
            ));
        }
        if actions + 2 >= max_actions {
            warn!(
                actions,
                max_actions,
                url,
                "provider_auth nearing action ceiling without returning home; \
                 the OAuth exchange may have silently failed"
            );
        }
        Verdict::wait(format!(
            "still on provider at {url} after {actions} actions; awaiting redirect home"
        ))
    }

    /// Callback distinguishes "the provider authenticated the user but the
    /// home application rejected the account linking" (server-side,
    /// potentially fixable) from "the browser never came home at all"
    /// (automation failure).
    fn verify_callback(&self, url: &str) -> Verdict {
        if !self.on_home(url) {
            return Verdict::fail(format!(
                "callback never returned to {}; at {url}",
                self.policy.home_domain
            ));
        }
        if let Some(marker) = self
            .policy
            .oauth_error_markers
            .iter()
            .find(|marker| url.contains(marker.as_str()))
        {
            return Verdict::blocker(format!(
                "OAuth callback rejected by the application ({marker}): the provider \
                 authenticated the user but the server-side account-linking step failed; \
                 this needs a data fix (e.g. linking the account), not another retry"
            ));
        }
        if self.path_matches(url, &self.policy.verification_paths) {
            return Verdict::fail(format!("callback landed on an email-verification page: {url}"));
        }
        if self.path_matches(url, &self.policy.signin_paths) {
            return Verdict::wait(format!("back on home domain but still on a sign-in path: {url}"));
        }
        Verdict::advance("callback resolved on home domain with no error markers")
    }

    fn verify_dashboard(&self, url: &str) -> Verdict {
        if !self.on_home(url) {
            return Verdict::fail(format!(
                "expected an authenticated {} page, at {url}",
                self.policy.home_domain
            ));
        }
        if self.path_matches(url, &self.policy.signin_paths)
            || self.path_matches(url, &self.policy.verification_paths)
        {
            return Verdict::wait(format!(
                "still on a sign-in or verification path: {url}; session not yet established"
            ));
        }
        if self.path_matches(url, &self.policy.authenticated_paths) {
            return Verdict::advance("authenticated area reached");
        }
        Verdict::wait(format!(
            "on home domain but not an authenticated area: {url}; expected one of {:?}",
            self.policy.authenticated_paths
        ))
    }

    fn verify_signout(&self, url: &str) -> Verdict {
        if self.on_home(url)
            && (self.path_matches(url, &self.policy.signin_paths) || path_of(url) == "/")
        {
            return Verdict::advance("signed out back to the landing/sign-in page");
        }
        Verdict::wait(format!("awaiting sign-out redirect to {}, at {url}", self.policy.home_domain))
    }

    fn on_home(&self, url: &str) -> bool {
        host_contains(url, &self.policy.home_domain)
    }

    fn on_provider(&self, url: &str) -> bool {
        host_contains(url, &self.policy.provider_domain)
    }

    fn path_matches(&self, url: &str, fragments: &[String]) -> bool {
        let path = path_of(url);
        fragments.iter().any(|fragment| path.contains(fragment.as_str()))
    }
}

/// Host-level domain check with a substring fallback for relative or
/// unparseable URLs.
fn host_contains(url: &str, domain: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            let with_port = match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            host.contains(domain) || with_port.contains(domain)
        }
        Err(_) => url.contains(domain),
    }
}

fn path_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative URL: treat everything before the query as the path.
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}
