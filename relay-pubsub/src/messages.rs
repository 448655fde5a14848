use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_relay::messages::MSG_ERROR;

/// Message exchanged with websocket clients in both directions.
///
/// ```json
/// { "event": "request:account-states", "args": ["<address>"] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub event: String,
    #[serde(default)]
    pub args: Vec<Value>,
    /// Set by clients that want a label update acknowledged
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ack: bool,
}

impl RelayMessage {
    pub fn new(event: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            event: event.into(),
            args,
            ack: false,
        }
    }

    pub fn error(err: impl ToString) -> Self {
        Self::new(MSG_ERROR, vec![Value::String(err.to_string())])
    }
}
