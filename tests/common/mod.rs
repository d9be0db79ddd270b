// tests/common/mod.rs
//
// Shared fakes for integration tests: an in-memory Slack, canned rewriters,
// and a request signer that produces valid `v0` signatures.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use review_doctor::rewrite::{RewriteError, Rewriter};
use review_doctor::slack::signature::compute_signature;
use review_doctor::slack::{PinnedMessage, SlackApi, SlackApiError};
use review_doctor::AppState;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const BOT_USER_ID: &str = "UBOT";

pub fn pin(text: &str, user: &str, ts: &str) -> PinnedMessage {
    PinnedMessage {
        text: text.to_string(),
        user: Some(user.to_string()),
        ts: ts.to_string(),
        permalink: format!("https://example.slack.com/archives/C1/p{}", ts.replace('.', "")),
    }
}

/// In-memory Slack: serves configured pins, records every post.
#[derive(Default)]
pub struct FakeSlack {
    pins: Mutex<Vec<PinnedMessage>>,
    fail_pins: Mutex<Option<String>>,
    posts: Mutex<Vec<(String, String)>>,
}

impl FakeSlack {
    pub fn with_pins(pins: Vec<PinnedMessage>) -> Arc<Self> {
        let fake = Self::default();
        *fake.pins.lock() = pins;
        Arc::new(fake)
    }

    pub fn failing(code: &str) -> Arc<Self> {
        let fake = Self::default();
        *fake.fail_pins.lock() = Some(code.to_string());
        Arc::new(fake)
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().clone()
    }

    /// Background tasks post after the HTTP ack; poll until something lands.
    pub async fn wait_for_posts(&self, n: usize) -> Vec<(String, String)> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let posts = self.posts();
            if posts.len() >= n || tokio::time::Instant::now() >= deadline {
                return posts;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn pinned_messages(&self, _channel: &str) -> Result<Vec<PinnedMessage>, SlackApiError> {
        if let Some(code) = self.fail_pins.lock().clone() {
            return Err(SlackApiError::Api {
                method: "pins.list",
                code,
            });
        }
        Ok(self.pins.lock().clone())
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackApiError> {
        self.posts.lock().push((channel.to_string(), text.to_string()));
        Ok(())
    }

    async fn bot_user_id(&self) -> Result<String, SlackApiError> {
        Ok(BOT_USER_ID.to_string())
    }
}

/// Returns a fixed reply and counts calls.
pub struct CannedRewriter {
    reply: Result<String, ()>,
    calls: AtomicUsize,
}

impl CannedRewriter {
    pub fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Rewriter for CannedRewriter {
    async fn rewrite(&self, _summary: &str) -> Result<String, RewriteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(()) => Err(RewriteError::Status(500)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "canned"
    }
}

pub fn state(slack: Arc<FakeSlack>, rewriter: Arc<CannedRewriter>) -> AppState {
    AppState::new(slack, rewriter, SIGNING_SECRET, BOT_USER_ID, 300)
}

pub fn now_ts() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// (timestamp, signature) headers for `body` signed with the test secret.
pub fn sign(body: &str) -> (String, String) {
    let ts = now_ts();
    let sig = compute_signature(&ts, body.as_bytes(), SIGNING_SECRET.as_bytes());
    (ts, sig)
}
