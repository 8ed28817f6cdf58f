//! In-process log of remediation activity.

use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Serialize;

static REMEDIATION_EVENTS: Lazy<RwLock<Vec<RemediationEvent>>> =
    Lazy::new(|| RwLock::new(Vec::new()));

/// One recorded remediation step.
#[derive(Clone, Debug, Serialize)]
pub struct RemediationEvent {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,

    /// Provider the remediation ran for.
    pub provider: String,

    /// Step name: "diagnosed", "proposed", "applied", "rejected".
    pub step: String,

    pub note: Option<String>,
}

impl RemediationEvent {
    pub fn now(provider: impl Into<String>, step: impl Into<String>, note: Option<String>) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            provider: provider.into(),
            step: step.into(),
            note,
        }
    }
}

/// Append an event to the in-process log.
pub fn record_event(event: RemediationEvent) {
    REMEDIATION_EVENTS.write().push(event);
}

/// Most recent events, newest last, capped at `limit`.
pub fn recent_events(limit: usize) -> Vec<RemediationEvent> {
    let events = REMEDIATION_EVENTS.read();
    let start = events.len().saturating_sub(limit);
    events[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_caps_recent() {
        for i in 0..5 {
            record_event(RemediationEvent::now("github", "diagnosed", Some(format!("e{i}"))));
        }
        let recent = recent_events(3);
        assert!(recent.len() <= 3);
        assert!(recent.iter().all(|e| e.provider == "github"));
    }
}
