use serde_json::Value;

use super::notification::Notification;

/// Frames delivered over the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEnvelope {
    /// Server handshake sent right after the socket is accepted.
    Connected,
    Notification(Notification),
    Pong,
    /// Well-formed frame with a type this client does not consume.
    Other(String),
}

impl PushEnvelope {
    /// Decodes a text frame. Returns `None` for anything malformed: invalid
    /// JSON, a missing `type`, or a `notification` frame whose `data` is not
    /// a valid notification record.
    pub fn parse(text: &str) -> Option<Self> {
        let parsed: Value = serde_json::from_str(text).ok()?;
        let msg_type = parsed.get("type").and_then(|t| t.as_str())?;

        match msg_type {
            "connected" => Some(PushEnvelope::Connected),
            "pong" => Some(PushEnvelope::Pong),
            "notification" => {
                let data = parsed.get("data")?.clone();
                serde_json::from_value(data)
                    .ok()
                    .map(PushEnvelope::Notification)
            }
            other => Some(PushEnvelope::Other(other.to_string())),
        }
    }
}
