use crate::issue::ProcessedIssue;
use crate::week::WeekBucket;

/// Order issues done → in progress → todo, then by priority (lower first).
/// Stable: equal keys keep their input order.
pub fn sort_issues(issues: &mut [ProcessedIssue]) {
    issues.sort_by_key(|issue| (issue.category.rank(), issue.priority));
}

pub fn sort_buckets(buckets: &mut [WeekBucket]) {
    for bucket in buckets {
        sort_issues(&mut bucket.issues);
    }
}
