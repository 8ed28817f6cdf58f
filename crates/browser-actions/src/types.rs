//! Typed action vocabulary and page-state snapshot types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ActionError;

/// Upper bound of the normalized coordinate grid.
///
/// Coordinates in actions are expressed on a 0..=1000 grid independent of
/// the actual viewport size; the executor scales them to device pixels.
pub const GRID_MAX: u32 = 1000;

/// One UI action the proposer can request against a live page.
///
/// The set is closed: payloads with an unrecognized `action` tag fail to
/// deserialize and surface as [`ActionError::UnknownAction`] via
/// [`BrowserAction::from_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowserAction {
    /// Click at a grid position.
    ClickAt { x: u32, y: u32 },

    /// Click at a grid position, then type text into the focused element.
    TypeAt { x: u32, y: u32, text: String },

    /// Scroll by grid-relative deltas.
    Scroll { dx: i32, dy: i32 },

    /// Navigate to an absolute URL.
    Navigate { url: String },

    /// Press a key combination (e.g. "Enter", "Control+a").
    KeyCombo { keys: String },

    /// History navigation: back.
    GoBack,

    /// History navigation: forward.
    GoForward,

    /// Move the pointer to a grid position without clicking.
    HoverAt { x: u32, y: u32 },
}

impl BrowserAction {
    /// Stable wire name of the action variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClickAt { .. } => "click_at",
            Self::TypeAt { .. } => "type_at",
            Self::Scroll { .. } => "scroll",
            Self::Navigate { .. } => "navigate",
            Self::KeyCombo { .. } => "key_combo",
            Self::GoBack => "go_back",
            Self::GoForward => "go_forward",
            Self::HoverAt { .. } => "hover_at",
        }
    }

    /// Parse an action from a JSON payload.
    ///
    /// An unrecognized `action` tag yields [`ActionError::UnknownAction`]
    /// rather than a silent no-op.
    pub fn from_value(value: Value) -> Result<Self, ActionError> {
        let tag = value
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_string);
        serde_json::from_value(value).map_err(|err| match tag {
            Some(tag) if !KNOWN_ACTIONS.contains(&tag.as_str()) => {
                ActionError::UnknownAction(tag)
            }
            _ => ActionError::InvalidPayload(err.to_string()),
        })
    }

    /// Validate grid coordinates against the normalized 0..=1000 range.
    pub fn validate(&self) -> Result<(), ActionError> {
        match self {
            Self::ClickAt { x, y } | Self::TypeAt { x, y, .. } | Self::HoverAt { x, y } => {
                check_coord("x", *x)?;
                check_coord("y", *y)
            }
            Self::Navigate { url } => {
                if url.is_empty() {
                    return Err(ActionError::InvalidPayload(
                        "navigate requires a non-empty url".to_string(),
                    ));
                }
                Ok(())
            }
            Self::KeyCombo { keys } => {
                if keys.is_empty() {
                    return Err(ActionError::InvalidPayload(
                        "key_combo requires a non-empty key sequence".to_string(),
                    ));
                }
                Ok(())
            }
            Self::Scroll { .. } | Self::GoBack | Self::GoForward => Ok(()),
        }
    }
}

const KNOWN_ACTIONS: &[&str] = &[
    "click_at",
    "type_at",
    "scroll",
    "navigate",
    "key_combo",
    "go_back",
    "go_forward",
    "hover_at",
];

fn check_coord(field: &'static str, value: u32) -> Result<(), ActionError> {
    if value > GRID_MAX {
        return Err(ActionError::CoordinateOutOfRange { field, value });
    }
    Ok(())
}

/// Snapshot of the observable browser state.
#[derive(Debug, Clone)]
pub struct PageState {
    /// Current page URL.
    pub url: String,

    /// Page title, when the driver can report one.
    pub title: Option<String>,

    /// Raw screenshot bytes (PNG).
    pub screenshot: Vec<u8>,
}

impl PageState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            screenshot: Vec::new(),
        }
    }
}

/// Structured result of one executed action.
///
/// Expected action-level failures (unknown target, out-of-range
/// coordinates, element not interactable) are reported here with
/// `success: false`, never as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Whether the action took effect.
    pub success: bool,

    /// Echoed wire name of the executed action.
    pub action: String,

    /// Failure detail when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Echoed action arguments for reporting.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

impl ActionOutcome {
    /// Successful outcome for the given action.
    pub fn ok(action: &BrowserAction) -> Self {
        Self {
            success: true,
            action: action.name().to_string(),
            error: None,
            args: serde_json::to_value(action).unwrap_or(Value::Null),
        }
    }

    /// Failed outcome with a descriptive error.
    pub fn failed(action: &BrowserAction, error: impl Into<String>) -> Self {
        Self {
            success: false,
            action: action.name().to_string(),
            error: Some(error.into()),
            args: serde_json::to_value(action).unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_serializes_with_tag() {
        let action = BrowserAction::ClickAt { x: 500, y: 320 };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"action\":\"click_at\""));
        assert!(json.contains("\"x\":500"));
    }

    #[test]
    fn unknown_tag_is_a_typed_error() {
        let err = BrowserAction::from_value(json!({"action": "teleport", "x": 1})).unwrap_err();
        assert!(matches!(err, ActionError::UnknownAction(tag) if tag == "teleport"));
    }

    #[test]
    fn known_tag_with_bad_fields_is_invalid_payload() {
        let err = BrowserAction::from_value(json!({"action": "click_at"})).unwrap_err();
        assert!(matches!(err, ActionError::InvalidPayload(_)));
    }

    #[test]
    fn coordinates_validate_against_grid() {
        assert!(BrowserAction::ClickAt { x: 1000, y: 0 }.validate().is_ok());
        let err = BrowserAction::HoverAt { x: 1001, y: 0 }.validate().unwrap_err();
        assert!(matches!(
            err,
            ActionError::CoordinateOutOfRange { field: "x", value: 1001 }
        ));
    }

    #[test]
    fn outcome_echoes_action_name() {
        let action = BrowserAction::Navigate {
            url: "https://example.com".to_string(),
        };
        let outcome = ActionOutcome::failed(&action, "navigation timeout");
        assert!(!outcome.success);
        assert_eq!(outcome.action, "navigate");
        assert_eq!(outcome.error.as_deref(), Some("navigation timeout"));
    }
}
