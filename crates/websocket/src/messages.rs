use serde::{Deserialize, Serialize};

use events::ProgressEvent;

/// The one message a client sends: the mutation target.
///
/// Accepted either as the bare target string or as `{"target": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientMessage {
    pub target: String,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.starts_with('{') {
            return serde_json::from_str::<Self>(text)
                .map(|msg| Self {
                    target: msg.target.trim().to_string(),
                })
                .map_err(|e| format!("Invalid target message: {}", e));
        }

        Ok(Self {
            target: text.to_string(),
        })
    }
}

/// Encode a progress record as the JSON text sent to the client.
pub fn encode_event(event: &ProgressEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode progress event");
            None
        }
    }
}
