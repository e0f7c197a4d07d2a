//! Inbound message classification.
//!
//! Exactly one route is chosen per message, checked in a fixed order: a
//! health-probe response must win over the generic `message` handling it
//! would otherwise also match.

use avatar_common::RequestId;
use serde_json::Value;

use crate::protocol::{kinds, MODE_SWITCH_SUCCESS, STATUS_ACTIVE, SUCCESS_CODE};

/// Where an inbound message goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// `{type:"avatar", face}`
    Face(String),
    /// `{type:"asr", text}`
    Subtitle(String),
    /// `{type:"person_greeting_status", value}`
    Countdown(f64),
    /// Response to the outstanding liveness probe.
    HealthResponse { request_id: RequestId, active: bool },
    /// `{code:0, message:"Successfully switched to mode ..."}`
    ModeSwitched { message: String },
    /// Any other message with a `message` field; expected to hold mode data.
    ModeMessage(Value),
    /// Nothing to do.
    Ignored,
}

/// Classify a parsed inbound object.
///
/// `outstanding_probe` is the id of the health probe currently awaited, if any.
pub fn classify(msg: &Value, outstanding_probe: Option<&RequestId>) -> Route {
    let kind = msg.get("type").and_then(Value::as_str);

    if kind == Some(kinds::AVATAR) {
        if let Some(face) = non_empty_str(msg, "face") {
            return Route::Face(face.to_string());
        }
    }

    if kind == Some(kinds::ASR) {
        if let Some(text) = non_empty_str(msg, "text") {
            return Route::Subtitle(text.to_string());
        }
    }

    if kind == Some(kinds::PERSON_GREETING_STATUS) {
        if let Some(value) = msg.get("value").and_then(Value::as_f64) {
            return Route::Countdown(value);
        }
    }

    if let (Some(probe), Some(request_id)) =
        (outstanding_probe, msg.get("request_id").and_then(Value::as_str))
    {
        if probe.as_str() == request_id {
            let active = is_success(msg)
                && msg.get("status").and_then(Value::as_str) == Some(STATUS_ACTIVE);
            return Route::HealthResponse {
                request_id: probe.clone(),
                active,
            };
        }
    }

    if is_success(msg) {
        if let Some(message) = msg.get("message").and_then(Value::as_str) {
            if message.contains(MODE_SWITCH_SUCCESS) {
                return Route::ModeSwitched {
                    message: message.to_string(),
                };
            }
        }
    }

    match msg.get("message") {
        Some(message) if is_truthy(message) => Route::ModeMessage(message.clone()),
        _ => Route::Ignored,
    }
}

/// The `request_id` echoed by a response, if any.
pub fn response_request_id(msg: &Value) -> Option<RequestId> {
    msg.get("request_id")
        .and_then(Value::as_str)
        .map(RequestId::from)
}

fn is_success(msg: &Value) -> bool {
    msg.get("code").and_then(Value::as_f64) == Some(SUCCESS_CODE as f64)
}

fn non_empty_str<'a>(msg: &'a Value, key: &str) -> Option<&'a str> {
    msg.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
