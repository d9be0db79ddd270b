// src/slack/payload.rs
//! Wire shapes for what Slack sends us and what its Web API returns.

use serde::Deserialize;

/// Slash command callback (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlashCommand {
    pub command: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub user_id: String,
}

/// Events API envelope (JSON).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    UrlVerification { challenge: String },
    EventCallback { event: InnerEvent },
    #[serde(other)]
    Other,
}

/// The `event` object inside an `event_callback`. Only the fields we route on.
#[derive(Debug, Clone, Deserialize)]
pub struct InnerEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// A pinned message as returned inside a `pins.list` item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PinnedMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: Option<String>,
    pub ts: String,
    #[serde(default)]
    pub permalink: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PinnedItem {
    #[serde(default)]
    pub message: Option<PinnedMessage>,
}
