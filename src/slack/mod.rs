//! Slack boundary: request signing, payload shapes, and the Web API client.

pub mod client;
pub mod payload;
pub mod signature;

pub use client::{HttpSlackClient, SlackApi, SlackApiError};
pub use payload::{EventEnvelope, InnerEvent, PinnedMessage, SlashCommand};
