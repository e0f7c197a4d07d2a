//! Wire protocol spoken with the avatar backend.
//!
//! Outbound requests are typed and serialized with serde. Inbound payloads
//! are loosely shaped, so they stay as `serde_json::Value` until the
//! dispatcher has classified them.

use avatar_common::RequestId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `code` value the backend uses for success.
pub const SUCCESS_CODE: i64 = 0;

/// Status reported by a healthy avatar subsystem.
pub const STATUS_ACTIVE: &str = "active";

/// Prefix of the acknowledgement sent after a successful mode switch.
pub const MODE_SWITCH_SUCCESS: &str = "Successfully switched to mode";

/// Inbound `type` discriminators.
pub mod kinds {
    pub const AVATAR: &str = "avatar";
    pub const ASR: &str = "asr";
    pub const PERSON_GREETING_STATUS: &str = "person_greeting_status";
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Requests sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OutboundMessage {
    GetMode {
        request_id: RequestId,
    },
    SwitchMode {
        request_id: RequestId,
        parameters: String,
    },
    GetAvatarStatus {
        request_id: RequestId,
    },
}

impl OutboundMessage {
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::GetMode { request_id }
            | Self::SwitchMode { request_id, .. }
            | Self::GetAvatarStatus { request_id } => request_id,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Parse a raw text frame into a JSON object.
pub fn parse_inbound(text: &str) -> Result<Value, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(ProtocolError::NotAnObject(json_type_name(&value)))
    }
}

/// Mode information carried in a `message` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeSnapshot {
    pub current_mode: Option<String>,
    pub all_modes: Option<Vec<String>>,
}

impl ModeSnapshot {
    /// Parse the `message` field of a mode response.
    ///
    /// The backend sends the snapshot as a JSON-encoded string; an inline
    /// object is accepted too. Non-string entries in `all_modes` are skipped
    /// and an empty `current_mode` counts as absent.
    pub fn parse(message: &Value) -> Result<Self, ProtocolError> {
        let decoded;
        let object = match message {
            Value::String(s) => {
                decoded = serde_json::from_str::<Value>(s)?;
                &decoded
            }
            other => other,
        };
        let Some(map) = object.as_object() else {
            return Err(ProtocolError::NotAnObject(json_type_name(object)));
        };

        let current_mode = map
            .get("current_mode")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let all_modes = map.get("all_modes").and_then(Value::as_array).map(|modes| {
            modes
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });

        Ok(Self {
            current_mode,
            all_modes,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
