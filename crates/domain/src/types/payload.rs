//! Remote notification payload classification
//!
//! Payloads arrive as the raw `userInfo` dictionary of an APNs/FCM delivery.
//! Silent pushes (`aps.content-available == 1`) carry a `data` object whose
//! `type` becomes the helper's command; alert pushes are only logged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Command handed to the local helper for a silent push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundCommand {
    /// `data.type`, passed to the helper as its only argument.
    pub kind: String,
    pub message: String,
    pub user: String,
}

/// Visible notification content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub subtitle: String,
    pub body: String,
}

/// What the agent should do with a remote notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushAction {
    Background(BackgroundCommand),
    /// Silent push without a `data` object.
    BackgroundWithoutData,
    Alert(Alert),
    Ignored,
}

impl PushAction {
    /// Classify a `userInfo` payload.
    pub fn classify(payload: &Value) -> Self {
        let Some(aps) = payload.get("aps").and_then(Value::as_object) else {
            return Self::Ignored;
        };

        if aps.get("content-available").and_then(Value::as_i64) == Some(1) {
            return match payload.get("data").and_then(Value::as_object) {
                Some(data) => Self::Background(BackgroundCommand {
                    kind: string_field(data, "type"),
                    message: string_field(data, "message"),
                    user: string_field(data, "user"),
                }),
                None => Self::BackgroundWithoutData,
            };
        }

        match aps.get("alert") {
            Some(Value::Object(alert)) => Self::Alert(Alert {
                title: string_field(alert, "title"),
                subtitle: string_field(alert, "subtitle"),
                body: string_field(alert, "body"),
            }),
            Some(Value::String(title)) => Self::Alert(Alert { title: title.clone(), ..Alert::default() }),
            _ => Self::Ignored,
        }
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}
