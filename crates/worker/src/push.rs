//! Push payloads and notification intents.
//!
//! An inbound push payload is parsed leniently (a malformed payload must
//! never take the worker down) and turned into a notification intent with
//! fixed fallback defaults. A click on the notification yields a navigation
//! target taken from the payload's opaque data.

use serde::{Deserialize, Serialize};

/// An action button on a rendered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Structured push payload; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Opaque data echoed back on notification click; expected to carry a
    /// `url` field.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub actions: Vec<NotificationAction>,
}

impl PushPayload {
    /// Parse a raw push payload, falling back to the empty payload on
    /// malformed input.
    pub fn parse(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        match serde_json::from_slice(raw) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "malformed push payload; using defaults");
                Self::default()
            }
        }
    }
}

const DEFAULT_TITLE: &str = "Coinstash";
const DEFAULT_BODY: &str = "You have a new notification";
const DEFAULT_ICON: &str = "/icon.png";

/// Everything needed to render one notification. Ephemeral; never persisted
/// beyond display.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationIntent {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: serde_json::Value,
    pub actions: Vec<NotificationAction>,
}

impl NotificationIntent {
    /// Build an intent from a payload, filling gaps with fixed defaults.
    pub fn from_payload(payload: PushPayload) -> Self {
        Self {
            title: payload.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: payload.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_ICON.to_string(),
            vibrate: vec![200, 100, 200],
            data: payload.data.unwrap_or_else(|| serde_json::json!({})),
            actions: payload.actions,
        }
    }

    /// Where a click on this notification should take the user.
    pub fn click_target(&self) -> String {
        click_target(&self.data)
    }
}

/// Navigation target carried in notification data, defaulting to the
/// application root.
pub fn click_target(data: &serde_json::Value) -> String {
    data.get("url")
        .and_then(|v| v.as_str())
        .unwrap_or("/")
        .to_string()
}
