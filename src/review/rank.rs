// src/review/rank.rs
//! Ordering policy: high priority first, then target, then oldest first.

use std::cmp::Ordering;

use super::extract::ReviewRequest;

/// Three-way comparison used for ranking.
///
/// Priority only decides when exactly one side is high priority; otherwise the
/// target (lexicographic) and then the timestamp (earlier first) decide.
pub fn compare(a: &ReviewRequest, b: &ReviewRequest) -> Ordering {
    b.is_high_priority
        .cmp(&a.is_high_priority)
        .then_with(|| a.target.cmp(&b.target))
        .then_with(|| a.timestamp.cmp(&b.timestamp))
}

/// Stable sort by [`compare`]; ties keep their input order.
pub fn rank(mut requests: Vec<ReviewRequest>) -> Vec<ReviewRequest> {
    requests.sort_by(compare);
    requests
}
