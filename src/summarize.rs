//! # Summarize
//! Pinned messages → ranked summary → optional rewrite. Mirrors what `/summarize` posts.
//!
//! Failure policy: a failed pin fetch yields [`TRY_AGAIN_MESSAGE`]; a failed rewrite
//! falls back to the plain summary.

use tracing::{error, info};

use crate::metrics;
use crate::review::{collect_requests, format_summary, normalize_links, rank};
use crate::rewrite::{rewrite_or_fallback, RewriteOutcome, Rewriter};
use crate::slack::SlackApi;

/// Shown to the channel when Slack itself fails us. The cause is only logged.
pub const TRY_AGAIN_MESSAGE: &str = "Something went wrong. Please try again later.";

pub async fn summarize_requests(
    slack: &dyn SlackApi,
    rewriter: &dyn Rewriter,
    channel_id: &str,
    bot_user_id: &str,
) -> String {
    let pinned = match slack.pinned_messages(channel_id).await {
        Ok(p) => p,
        Err(e) => {
            error!(channel = channel_id, error = %e, "failed to list pinned messages");
            metrics::record_platform_error(e.method());
            metrics::record_summary("platform_error");
            return TRY_AGAIN_MESSAGE.to_string();
        }
    };

    let ranked = rank(collect_requests(&pinned, bot_user_id));
    let summary = format_summary(&ranked);
    if ranked.is_empty() {
        metrics::record_summary("empty");
        return summary;
    }

    info!(
        channel = channel_id,
        pinned = pinned.len(),
        requests = ranked.len(),
        "summarizing review requests"
    );

    match rewrite_or_fallback(rewriter, &summary).await {
        RewriteOutcome::Rewritten(text) => {
            metrics::record_summary("rewritten");
            normalize_links(&text)
        }
        RewriteOutcome::Fallback { original, .. } => {
            metrics::record_rewrite_fallback();
            metrics::record_summary("plain");
            original
        }
    }
}
