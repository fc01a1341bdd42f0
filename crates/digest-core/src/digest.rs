use crate::issue::RawIssue;
use crate::render::{render, render_message, Document, EmojiSet, SlackMessage};
use crate::sort::sort_buckets;
use crate::week::{bucket, WeekBucket};
use chrono::{DateTime, FixedOffset, Utc};

/// Bucket and sort normalized issues. Buckets are ascending by week and
/// never empty.
pub fn build_digest(issues: &[RawIssue], now: DateTime<Utc>, tz: FixedOffset) -> Vec<WeekBucket> {
    let mut buckets = bucket(issues, now, tz);
    sort_buckets(&mut buckets);
    buckets
}

pub fn documents(buckets: &[WeekBucket]) -> Vec<Document> {
    buckets.iter().map(render).collect()
}

/// Full pipeline from normalized issues to a postable message, or `None`
/// when nothing is reportable.
pub fn compose(
    issues: &[RawIssue],
    now: DateTime<Utc>,
    tz: FixedOffset,
    emoji: &EmojiSet,
    fallback: &str,
) -> Option<SlackMessage> {
    let buckets = build_digest(issues, now, tz);
    if buckets.is_empty() {
        return None;
    }
    Some(render_message(&documents(&buckets), emoji, fallback))
}
