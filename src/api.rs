use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::mention::echo_reply;
use crate::metrics;
use crate::rewrite::DynRewriter;
use crate::slack::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::slack::{EventEnvelope, InnerEvent, SlackApi, SlashCommand};
use crate::summarize::summarize_requests;

pub const SUMMARIZE_COMMAND: &str = "/summarize";
/// Set by Slack when it redelivers an event whose acknowledgement it did not see.
pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";
const RETRY_REASON_HEADER: &str = "x-slack-retry-reason";

#[derive(Clone)]
pub struct AppState {
    pub slack: Arc<dyn SlackApi>,
    pub rewriter: DynRewriter,
    signing_secret: Arc<str>,
    bot_user_id: Arc<str>,
    max_request_age_secs: u64,
    tasks: TaskTracker,
}

impl AppState {
    pub fn new(
        slack: Arc<dyn SlackApi>,
        rewriter: DynRewriter,
        signing_secret: impl Into<String>,
        bot_user_id: impl Into<String>,
        max_request_age_secs: u64,
    ) -> Self {
        Self {
            slack,
            rewriter,
            signing_secret: Arc::from(signing_secret.into()),
            bot_user_id: Arc::from(bot_user_id.into()),
            max_request_age_secs,
            tasks: TaskTracker::new(),
        }
    }

    pub fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    /// Background work started after an acknowledgement. Close and wait on it at
    /// shutdown so acknowledged commands still get their post.
    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/slack/events", post(slack_events))
        .route("/summarize", post(summarize_command))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn slack_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    metrics::record_request("slack_events");
    verify_request(&state, &headers, &body)?;

    let retry_num = header_str(&headers, RETRY_NUM_HEADER);
    if !retry_num.is_empty() {
        // The first delivery already spawned its handler; a second one would post twice.
        debug!(
            retry_num,
            reason = header_str(&headers, RETRY_REASON_HEADER),
            "ignoring slack event redelivery"
        );
        return Ok(StatusCode::OK.into_response());
    }
    dispatch(&state, &headers, &body)
}

async fn summarize_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    metrics::record_request("summarize");
    verify_request(&state, &headers, &body)?;
    dispatch(&state, &headers, &body)
}

/// Route a verified request by content type: form is a slash command, anything else an event.
fn dispatch(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Response, AppError> {
    let content_type = header_str(headers, CONTENT_TYPE.as_str());

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let cmd: SlashCommand = serde_urlencoded::from_bytes(body)
            .map_err(|e| AppError::BadRequest(format!("slash command form: {e}")))?;
        Ok(handle_slash_command(state, cmd))
    } else {
        let envelope: EventEnvelope = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("event payload: {e}")))?;
        Ok(handle_event(state, envelope))
    }
}

/// Replay guard, then signature check.
fn verify_request(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    let timestamp = header_str(headers, TIMESTAMP_HEADER);
    let provided = header_str(headers, SIGNATURE_HEADER);

    let now = chrono::Utc::now().timestamp();
    if !signature::is_fresh(timestamp, now, state.max_request_age_secs) {
        warn!(timestamp, "rejected slack request outside the replay window");
        metrics::record_signature_failure();
        return Err(AppError::VerificationFailure);
    }

    if signature::verify(provided, timestamp, body, false, state.signing_secret.as_bytes())? {
        Ok(())
    } else {
        metrics::record_signature_failure();
        Err(AppError::VerificationFailure)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Acknowledge right away; the work and the channel post happen in the background.
fn handle_slash_command(state: &AppState, cmd: SlashCommand) -> Response {
    if cmd.command != SUMMARIZE_COMMAND {
        debug!(command = %cmd.command, "ignoring unknown slash command");
        return StatusCode::OK.into_response();
    }
    info!(channel = %cmd.channel_id, user = %cmd.user_id, "summarize requested");
    let state = state.clone();
    let tasks = state.tasks.clone();
    tasks.spawn(async move { post_summary(state, cmd.channel_id).await });
    StatusCode::OK.into_response()
}

/// Summarize and post once. A failed post is logged, never retried.
pub async fn post_summary(state: AppState, channel_id: String) {
    let text = summarize_requests(
        state.slack.as_ref(),
        state.rewriter.as_ref(),
        &channel_id,
        state.bot_user_id(),
    )
    .await;
    if let Err(e) = state.slack.post_message(&channel_id, &text).await {
        error!(channel = %channel_id, error = %e, "failed to post summary");
        metrics::record_platform_error(e.method());
    }
}

fn handle_event(state: &AppState, envelope: EventEnvelope) -> Response {
    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventEnvelope::EventCallback { event } if event.kind == "app_mention" => {
            let state = state.clone();
            let tasks = state.tasks.clone();
            tasks.spawn(async move { reply_to_mention(state, event).await });
            StatusCode::OK.into_response()
        }
        EventEnvelope::EventCallback { event } => {
            debug!(event_type = %event.kind, "ignoring unhandled slack event type");
            StatusCode::OK.into_response()
        }
        EventEnvelope::Other => StatusCode::OK.into_response(),
    }
}

async fn reply_to_mention(state: AppState, event: InnerEvent) {
    let Some(channel) = event.channel.as_deref() else {
        warn!("app_mention without a channel");
        return;
    };
    debug!(channel, user = event.user.as_deref().unwrap_or("-"), "answering mention");
    let reply = echo_reply(&event.text, state.bot_user_id());
    if let Err(e) = state.slack.post_message(channel, &reply).await {
        error!(channel, error = %e, "failed to answer mention");
        metrics::record_platform_error(e.method());
    }
}
