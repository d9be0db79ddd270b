// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod mention;
pub mod metrics;
pub mod review;
pub mod rewrite;
pub mod slack;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::review::ReviewRequest;
pub use crate::rewrite::{RewriteOutcome, Rewriter};
pub use crate::slack::SlackApi;
pub use crate::summarize::summarize_requests;
