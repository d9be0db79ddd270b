// src/bootstrap.rs
use crate::api::AppState;
use crate::config::AppConfig;
use crate::rewrite::build_rewriter;
use crate::slack::{HttpSlackClient, SlackApi};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

/// Wire the real Slack client and rewriter from configuration.
///
/// The bot user id comes from config or, failing that, one `auth.test` call. If that
/// call fails the service does not start: without the id the bot would summarize its
/// own posts.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let slack = Arc::new(
        HttpSlackClient::new(&config.server.slack_api_base, &config.slack.bot_token)
            .with_timeout(config.server.http_timeout_secs),
    );

    let bot_user_id = match &config.slack.bot_user_id {
        Some(id) => id.clone(),
        None => {
            let id = slack
                .bot_user_id()
                .await
                .context("resolving bot user id via auth.test")?;
            info!(bot_user_id = %id, "resolved bot identity via auth.test");
            id
        }
    };

    // Safe diagnostics: never the key itself, only its length
    info!(
        "Rewrite cfg loaded: provider={}, enabled={}, model={}, key_len={}",
        config.rewrite.provider,
        config.rewrite.enabled,
        config.rewrite.model,
        config.rewrite.api_key.len()
    );
    let rewriter = build_rewriter(&config.rewrite);

    Ok(AppState::new(
        slack,
        rewriter,
        config.slack.signing_secret.clone(),
        bot_user_id,
        config.server.max_request_age_secs,
    ))
}
