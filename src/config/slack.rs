// src/config/slack.rs
use anyhow::{anyhow, Result};

pub const ENV_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";
pub const ENV_SIGNING_SECRET: &str = "SLACK_SIGNING_SECRET";
pub const ENV_BOT_USER_ID: &str = "SLACK_BOT_USER_ID";

#[derive(Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub signing_secret: String,
    /// Resolved through `auth.test` at startup when absent.
    pub bot_user_id: Option<String>,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token_len", &self.bot_token.len())
            .field("signing_secret_len", &self.signing_secret.len())
            .field("bot_user_id", &self.bot_user_id)
            .finish()
    }
}

impl SlackConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let bot_token = get(ENV_BOT_TOKEN).ok_or_else(|| anyhow!("Missing {ENV_BOT_TOKEN} env var"))?;
        let signing_secret =
            get(ENV_SIGNING_SECRET).ok_or_else(|| anyhow!("Missing {ENV_SIGNING_SECRET} env var"))?;
        Ok(Self {
            bot_token,
            signing_secret,
            bot_user_id: get(ENV_BOT_USER_ID),
        })
    }
}
