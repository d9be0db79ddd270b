// src/review/extract.rs
//! Pull the review-request fields out of a pinned message.
//!
//! Expected message shape (free text around it is fine):
//! ```text
//! PR: Add retry to the uploader
//! target: Release-1.4
//! ```
//! Missing `PR:` / `target:` lines are not errors: the whole message is used instead.

use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

use crate::slack::PinnedMessage;

/// Marker a message must contain to count as a review request.
pub const PR_MARKER: &str = "PR:";
const TARGET_MARKER: &str = "target:";

const HIGH_PRIORITY_TOKENS: [&str; 4] = ["high priority", "p1", "emergency", "hotfix"];

/// One pending review request, built once per summarization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    pub text: String,
    pub url: String,
    pub target: String,
    pub timestamp: DateTime<Utc>,
    pub is_high_priority: bool,
}

impl ReviewRequest {
    /// Build from a pinned message. `None` when the Slack `ts` does not parse.
    pub fn from_pinned(message: &PinnedMessage) -> Option<Self> {
        let Some(timestamp) = parse_slack_ts(&message.ts) else {
            warn!(ts = %message.ts, "skipping pinned message with unparseable timestamp");
            return None;
        };
        Some(Self {
            text: extract_pr(&message.text),
            url: message.permalink.clone(),
            target: extract_target(&message.text),
            timestamp,
            is_high_priority: is_high_priority(&message.text),
        })
    }
}

/// Text after the first line starting with `PR:` (case-sensitive), trimmed.
/// Falls back to the whole message.
pub fn extract_pr(message: &str) -> String {
    for line in message.split('\n') {
        if line.starts_with(PR_MARKER) {
            return segment_after(line, PR_MARKER).trim().to_string();
        }
    }
    message.to_string()
}

/// Text after the first line starting with `target:` (any case), trimmed and lower-cased.
/// Falls back to the whole message, unchanged.
pub fn extract_target(message: &str) -> String {
    for line in message.split('\n') {
        let line = line.to_lowercase();
        if line.starts_with(TARGET_MARKER) {
            return segment_after(&line, TARGET_MARKER).trim().to_string();
        }
    }
    message.to_string()
}

/// Any of the urgency keywords, case-insensitive substring match.
pub fn is_high_priority(message: &str) -> bool {
    let lower = message.to_lowercase();
    HIGH_PRIORITY_TOKENS.iter().any(|t| lower.contains(t))
}

/// A pin counts only if it carries the marker and the bot did not write it.
pub fn is_eligible(message: &PinnedMessage, bot_user_id: &str) -> bool {
    message.text.contains(PR_MARKER) && message.user.as_deref() != Some(bot_user_id)
}

/// Eligible pins turned into requests, in input order.
pub fn collect_requests(messages: &[PinnedMessage], bot_user_id: &str) -> Vec<ReviewRequest> {
    messages
        .iter()
        .filter(|m| is_eligible(m, bot_user_id))
        .filter_map(ReviewRequest::from_pinned)
        .collect()
}

/// The piece between the first and second occurrence of `marker`.
fn segment_after<'a>(line: &'a str, marker: &str) -> &'a str {
    line.split(marker).nth(1).unwrap_or_default()
}

/// Slack `ts` values look like `"1700000000.000100"` (seconds.micros).
pub fn parse_slack_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = match ts.trim().split_once('.') {
        Some((s, f)) => (s, f),
        None => (ts.trim(), ""),
    };
    let secs: i64 = secs.parse().ok()?;
    let nanos = if frac.is_empty() {
        0
    } else {
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits: String = frac.chars().chain("000000000".chars()).take(9).collect();
        digits.parse::<u32>().ok()?
    };
    Utc.timestamp_opt(secs, nanos).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned(text: &str, user: &str, ts: &str) -> PinnedMessage {
        PinnedMessage {
            text: text.to_string(),
            user: Some(user.to_string()),
            ts: ts.to_string(),
            permalink: "https://example.slack.com/archives/C1/p1".to_string(),
        }
    }

    #[test]
    fn pr_line_is_extracted() {
        assert_eq!(extract_pr("foo\nPR: bar\n"), "bar");
        assert_eq!(extract_pr("PR:   spaced out   "), "spaced out");
    }

    #[test]
    fn pr_marker_is_case_sensitive() {
        assert_eq!(extract_pr("pr: lower"), "pr: lower");
    }

    #[test]
    fn pr_without_marker_falls_back_to_message() {
        assert_eq!(extract_pr("no marker here"), "no marker here");
    }

    #[test]
    fn pr_stops_at_repeated_marker() {
        assert_eq!(extract_pr("PR: first PR: second"), "first");
    }

    #[test]
    fn target_is_case_insensitive_and_lowered() {
        assert_eq!(extract_target("PR: x\nTarget: Release-1.4"), "release-1.4");
        assert_eq!(extract_target("TARGET:Main"), "main");
    }

    #[test]
    fn target_without_marker_returns_message_unchanged() {
        assert_eq!(extract_target("PR: Fix It"), "PR: Fix It");
    }

    #[test]
    fn target_marker_must_start_the_line() {
        assert_eq!(extract_target("the target: main"), "the target: main");
    }

    #[test]
    fn high_priority_keywords() {
        assert!(is_high_priority("This is P1!"));
        assert!(is_high_priority("HOTFIX for prod"));
        assert!(is_high_priority("an Emergency"));
        assert!(is_high_priority("high priority please"));
        assert!(!is_high_priority("normal request"));
    }

    #[test]
    fn eligibility_needs_marker_and_foreign_author() {
        assert!(is_eligible(&pinned("PR: a", "U1", "1.0"), "UBOT"));
        assert!(!is_eligible(&pinned("PR: a", "UBOT", "1.0"), "UBOT"));
        assert!(!is_eligible(&pinned("just a pin", "U1", "1.0"), "UBOT"));

        let mut anon = pinned("PR: a", "U1", "1.0");
        anon.user = None;
        assert!(is_eligible(&anon, "UBOT"));
    }

    #[test]
    fn slack_ts_parses_with_micros() {
        let t = parse_slack_ts("1700000000.000100").unwrap();
        assert_eq!(t.timestamp(), 1_700_000_000);
        assert_eq!(t.timestamp_subsec_micros(), 100);
        assert_eq!(parse_slack_ts("42").unwrap().timestamp(), 42);
        assert!(parse_slack_ts("abc").is_none());
        assert!(parse_slack_ts("1.2x").is_none());
    }

    #[test]
    fn from_pinned_fills_all_fields() {
        let msg = pinned("PR: Speed up CI\ntarget: Infra\nhotfix", "U1", "1700000000.5");
        let req = ReviewRequest::from_pinned(&msg).unwrap();
        assert_eq!(req.text, "Speed up CI");
        assert_eq!(req.target, "infra");
        assert!(req.is_high_priority);
        assert_eq!(req.url, msg.permalink);
        assert_eq!(req.timestamp.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn collect_skips_ineligible_and_bad_ts() {
        let msgs = vec![
            pinned("PR: one", "U1", "10.0"),
            pinned("PR: mine", "UBOT", "11.0"),
            pinned("PR: broken", "U2", "not-a-ts"),
            pinned("lunch menu", "U3", "12.0"),
        ];
        let reqs = collect_requests(&msgs, "UBOT");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].text, "one");
    }
}
