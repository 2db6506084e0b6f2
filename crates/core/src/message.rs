//! Control messages exchanged between pages and the router.
//!
//! Wire shapes:
//! - `{ "type": "SKIP_WAITING" }` (no reply)
//! - `{ "type": "GET_VERSION" }` (reply: `{ "type": "VERSION_RESPONSE", "version": "<tag>" }`)

use serde::{Deserialize, Serialize};

/// Inbound control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate now instead of waiting.
    SkipWaiting,
    /// Ask for the cache version tag.
    GetVersion,
}

impl ControlMessage {
    /// Recognize a message, or `None` for anything the router ignores.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Outbound reply sent on the caller's reply channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlReply {
    VersionResponse { version: String },
}
