//! Review-request pipeline: extract → rank → format. Pure, no I/O.

pub mod extract;
pub mod format;
pub mod rank;

pub use extract::{
    collect_requests, extract_pr, extract_target, is_eligible, is_high_priority, ReviewRequest,
};
pub use format::{format_summary, normalize_links, NO_REQUESTS_MESSAGE};
pub use rank::{compare, rank};
