// src/mention.rs
//! `app_mention` handling: echo the message back, shouted.

/// Remove `<@BOT_ID>`, trim, upper-case.
pub fn echo_reply(text: &str, bot_user_id: &str) -> String {
    let mention = format!("<@{bot_user_id}>");
    text.replace(&mention, "").trim().to_uppercase()
}
