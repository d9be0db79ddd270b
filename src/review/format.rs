// src/review/format.rs
//! Summary rendering and markdown → mrkdwn link conversion.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::extract::ReviewRequest;

/// Posted when nothing is waiting for review.
pub const NO_REQUESTS_MESSAGE: &str = "Hooray, no PRs to review! 🎉";

const SUMMARY_HEADER: &str = "Here's a summary of the PRs that need review";

// `[display](url)`: display stops at the first `]`, url at the first `)`.
static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("markdown link regex"));

/// Render ranked requests as a Slack message.
pub fn format_summary(requests: &[ReviewRequest]) -> String {
    if requests.is_empty() {
        return NO_REQUESTS_MESSAGE.to_string();
    }
    let bullets = requests
        .iter()
        .map(|r| format!("- {}", mrkdwn_link(&r.url, &r.text)))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{SUMMARY_HEADER}\n{} requests:\n{bullets}", requests.len())
}

/// `<url|text>`
pub fn mrkdwn_link(url: &str, text: &str) -> String {
    format!("<{url}|{text}>")
}

/// Rewrite every `[display](url)` into `<url|display>`; everything else is untouched.
pub fn normalize_links(message: &str) -> String {
    MARKDOWN_LINK
        .replace_all(message, |caps: &Captures| mrkdwn_link(&caps[2], &caps[1]))
        .into_owned()
}
