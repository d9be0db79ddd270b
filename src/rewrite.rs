//! Text rewriter: an optional chat-completion pass that restyles the summary.
//!
//! A rewrite never blocks posting. Callers go through [`rewrite_or_fallback`], which
//! turns every failure into [`RewriteOutcome::Fallback`] carrying the original text.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::rewrite::RewriteConfig;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("rewriter is disabled")]
    Disabled,
    #[error("rewrite request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rewrite service returned HTTP {0}")]
    Status(u16),
    #[error("rewrite service returned an empty completion")]
    EmptyCompletion,
}

/// Result of the best-effort rewrite step.
#[derive(Debug)]
pub enum RewriteOutcome {
    Rewritten(String),
    Fallback { original: String, reason: RewriteError },
}

impl RewriteOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Rewritten(text) => text,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten(_))
    }
}

#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, summary: &str) -> Result<String, RewriteError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynRewriter = Arc<dyn Rewriter>;

/// Run the rewriter and absorb any failure.
pub async fn rewrite_or_fallback(rewriter: &dyn Rewriter, summary: &str) -> RewriteOutcome {
    match rewriter.rewrite(summary).await {
        Ok(text) => RewriteOutcome::Rewritten(text),
        Err(reason) => {
            match &reason {
                RewriteError::Disabled => debug!("rewriter disabled, using plain summary"),
                other => warn!(
                    provider = rewriter.provider_name(),
                    error = %other,
                    "summary rewrite failed, using plain summary"
                ),
            }
            RewriteOutcome::Fallback {
                original: summary.to_string(),
                reason,
            }
        }
    }
}

/// Factory: disabled unless the config enables a supported provider with a key.
pub fn build_rewriter(config: &RewriteConfig) -> DynRewriter {
    if !config.enabled {
        return Arc::new(DisabledRewriter);
    }
    match config.provider.as_str() {
        "openai" if !config.api_key.is_empty() => Arc::new(OpenAiRewriter::from_config(config)),
        "openai" => {
            warn!("rewriter enabled but no OpenAI API key configured; disabling");
            Arc::new(DisabledRewriter)
        }
        other => {
            warn!(provider = other, "unsupported rewrite provider; disabling");
            Arc::new(DisabledRewriter)
        }
    }
}

/// Persona prompt; `{summary}` is replaced with the plain summary.
pub const PERSONA_PROMPT: &str = r#"
You are a funny and cool Project Manager. Your name is Review Doctor.

Make this message sound cool to request code review from the programmers.
At the end of the message add a short joke about programming, coding, or code review.
Do not lose any links. A link in Slack mrkdwn format is
<http://www.example.com|This message *is* a link>
Keep every link together with its text.

```
{summary}
```
"#;

pub fn persona_prompt(summary: &str) -> String {
    PERSONA_PROMPT.replace("{summary}", summary)
}

/// OpenAI Chat Completions.
pub struct OpenAiRewriter {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
}

impl OpenAiRewriter {
    pub fn from_config(config: &RewriteConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("review-doctor/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Rewriter for OpenAiRewriter {
    async fn rewrite(&self, summary: &str) -> Result<String, RewriteError> {
        let prompt = persona_prompt(summary);
        let req = ChatRequest {
            model: &self.model,
            messages: vec![Msg {
                role: "system",
                content: &prompt,
            }],
            temperature: self.temperature,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RewriteError::Status(status.as_u16()));
        }
        let body: ChatResponse = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(RewriteError::EmptyCompletion);
        }
        Ok(content.to_string())
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Always declines; the plain summary is posted.
pub struct DisabledRewriter;

#[async_trait]
impl Rewriter for DisabledRewriter {
    async fn rewrite(&self, _summary: &str) -> Result<String, RewriteError> {
        Err(RewriteError::Disabled)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Rewriter for Echo {
        async fn rewrite(&self, summary: &str) -> Result<String, RewriteError> {
            Ok(format!("{summary} (rewritten)"))
        }
        fn provider_name(&self) -> &'static str {
            "echo"
        }
    }

    #[tokio::test]
    async fn success_is_rewritten() {
        let out = rewrite_or_fallback(&Echo, "hello").await;
        assert!(out.is_rewritten());
        assert_eq!(out.text(), "hello (rewritten)");
    }

    #[tokio::test]
    async fn disabled_falls_back_to_original() {
        let out = rewrite_or_fallback(&DisabledRewriter, "hello").await;
        match out {
            RewriteOutcome::Fallback { original, reason } => {
                assert_eq!(original, "hello");
                assert!(matches!(reason, RewriteError::Disabled));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn prompt_embeds_summary() {
        let p = persona_prompt("- <https://x|Fix>");
        assert!(p.contains("Review Doctor"));
        assert!(p.contains("- <https://x|Fix>"));
        assert!(!p.contains("{summary}"));
    }

    #[test]
    fn factory_respects_config() {
        let mut cfg = RewriteConfig::default();
        assert_eq!(build_rewriter(&cfg).provider_name(), "disabled");

        cfg.enabled = true;
        assert_eq!(build_rewriter(&cfg).provider_name(), "disabled");

        cfg.api_key = "sk-test".into();
        assert_eq!(build_rewriter(&cfg).provider_name(), "openai");

        cfg.provider = "claude".into();
        assert_eq!(build_rewriter(&cfg).provider_name(), "disabled");
    }
}
