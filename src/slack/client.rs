// src/slack/client.rs
//! Slack Web API client: the three calls the bot needs.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::payload::{PinnedItem, PinnedMessage};

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("{method} request failed: {source}")]
    Http {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} returned error: {code}")]
    Api { method: &'static str, code: String },
    #[error("{method} response missing field `{field}`")]
    MissingField {
        method: &'static str,
        field: &'static str,
    },
}

impl SlackApiError {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Http { method, .. } | Self::Api { method, .. } | Self::MissingField { method, .. } => {
                method
            }
        }
    }
}

/// Outbound Slack operations. Implemented over HTTP in production and by fakes in tests.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `pins.list` for a channel; non-message pins are dropped.
    async fn pinned_messages(&self, channel: &str) -> Result<Vec<PinnedMessage>, SlackApiError>;
    /// `chat.postMessage`.
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackApiError>;
    /// `auth.test`: the bot's own user id.
    async fn bot_user_id(&self) -> Result<String, SlackApiError>;
}

pub struct HttpSlackClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    timeout: Duration,
}

impl HttpSlackClient {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent("review-doctor/0.1")
                .connect_timeout(Duration::from_secs(4))
                .build()
                .unwrap_or_default(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Slack answers 200 with `ok: false` on API errors, so the body decides success.
    async fn read_ok(method: &'static str, resp: reqwest::Response) -> Result<Value, SlackApiError> {
        let body: Value = resp
            .json()
            .await
            .map_err(|source| SlackApiError::Http { method, source })?;
        if body["ok"].as_bool() != Some(true) {
            let code = body["error"].as_str().unwrap_or("unknown").to_string();
            return Err(SlackApiError::Api { method, code });
        }
        Ok(body)
    }
}

#[derive(Deserialize)]
struct PinsListResponse {
    #[serde(default)]
    items: Vec<PinnedItem>,
}

#[async_trait]
impl SlackApi for HttpSlackClient {
    async fn pinned_messages(&self, channel: &str) -> Result<Vec<PinnedMessage>, SlackApiError> {
        const METHOD: &str = "pins.list";
        let resp = self
            .http
            .post(self.url(METHOD))
            .bearer_auth(&self.bot_token)
            .timeout(self.timeout)
            .form(&[("channel", channel)])
            .send()
            .await
            .map_err(|source| SlackApiError::Http { method: METHOD, source })?;
        let body = Self::read_ok(METHOD, resp).await?;

        let parsed: PinsListResponse = match serde_json::from_value(body) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "pins.list items did not match the expected shape");
                return Err(SlackApiError::MissingField {
                    method: METHOD,
                    field: "items",
                });
            }
        };
        let total = parsed.items.len();
        let messages: Vec<PinnedMessage> =
            parsed.items.into_iter().filter_map(|it| it.message).collect();
        debug!(channel, total, messages = messages.len(), "fetched pinned items");
        Ok(messages)
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackApiError> {
        const METHOD: &str = "chat.postMessage";
        let resp = self
            .http
            .post(self.url(METHOD))
            .bearer_auth(&self.bot_token)
            .timeout(self.timeout)
            .json(&json!({ "channel": channel, "text": text }))
            .send()
            .await
            .map_err(|source| SlackApiError::Http { method: METHOD, source })?;
        Self::read_ok(METHOD, resp).await?;
        Ok(())
    }

    async fn bot_user_id(&self) -> Result<String, SlackApiError> {
        const METHOD: &str = "auth.test";
        let resp = self
            .http
            .post(self.url(METHOD))
            .bearer_auth(&self.bot_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| SlackApiError::Http { method: METHOD, source })?;
        let body = Self::read_ok(METHOD, resp).await?;
        body["user_id"]
            .as_str()
            .map(str::to_string)
            .ok_or(SlackApiError::MissingField {
                method: METHOD,
                field: "user_id",
            })
    }
}
