//! Defines the structure of messages exchanged over WebSocket.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::models::{ChartFrame, CurveSnapshot};

/// Messages sent from the client to the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload")] // Use tagged enum representation
pub enum ClientMessage {
    /// Session token, first message when authentication is enabled.
    Auth { token: String },
    /// Supply typed into the supply field.
    SetSupply {
        #[serde(default, deserialize_with = "lenient_number")]
        value: f64,
    },
    /// Signed mint (+) / burn (-) amount.
    SetDelta {
        #[serde(default, deserialize_with = "lenient_number")]
        value: f64,
    },
    /// Unit price typed into the price field; the supply is solved from it.
    SetPrice {
        #[serde(default, deserialize_with = "lenient_number")]
        value: f64,
    },
    /// Pointer click on the plot, `offset_x` pixels from the left of a plot `width` pixels wide.
    ChartClick { offset_x: f64, width: f64 },
    /// Back to the configured starting supply and delta.
    Reset,
}

/// Messages sent from the server to the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Confirmation that authentication was successful.
    AuthOk,
    /// The reconciled state after an accepted input.
    Snapshot { snapshot: CurveSnapshot },
    /// Chart data, pushed after input bursts settle.
    Frame { frame: ChartFrame },
    /// Reports an error back to the client. The session state is unchanged.
    Error { message: String },
}

impl ServerMessage {
    // Message type string for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::AuthOk => "AuthOk",
            ServerMessage::Snapshot { .. } => "Snapshot",
            ServerMessage::Frame { .. } => "Frame",
            ServerMessage::Error { .. } => "Error",
        }
    }
}

/// Reads a form field value the way the input boxes do: numbers pass through,
/// numeric strings are parsed, and null, empty or non-numeric text becomes 0.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(value)
}
