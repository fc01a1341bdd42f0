use crate::error::{DigestError, Result};
use crate::issue::{ProcessedIssue, RawIssue};
use crate::state::StateCategory;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// WeekBucket
// ---------------------------------------------------------------------------

/// The reportable issues of one calendar week, keyed by its Monday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekBucket {
    pub week: NaiveDate,
    pub issues: Vec<ProcessedIssue>,
}

impl WeekBucket {
    /// `YYYY-MM-DD` of the week's Monday.
    pub fn label(&self) -> String {
        self.week.format("%Y-%m-%d").to_string()
    }

    pub fn has_blocked(&self) -> bool {
        self.issues.iter().any(ProcessedIssue::is_blocked)
    }
}

// ---------------------------------------------------------------------------
// WeekWindow
// ---------------------------------------------------------------------------

/// Monday of the week containing `t`, in the reference timezone `tz`.
pub fn week_start(t: DateTime<Utc>, tz: &FixedOffset) -> NaiveDate {
    let local = t.with_timezone(tz).date_naive();
    local - Duration::days(i64::from(local.weekday().num_days_from_monday()))
}

/// Parse an RFC 3339 instant such as `2026-01-07T15:00:00Z`.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DigestError::InvalidTimestamp(s.to_string()))
}

/// The two weeks a digest reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub this_week: NaiveDate,
    pub last_week: NaiveDate,
    pub tz: FixedOffset,
}

impl WeekWindow {
    pub fn new(now: DateTime<Utc>, tz: FixedOffset) -> Self {
        let this_week = week_start(now, &tz);
        Self {
            this_week,
            last_week: this_week - Duration::days(7),
            tz,
        }
    }

    /// Midnight at the start of last week, as an instant. Used to scope the
    /// completed-issues query server-side.
    pub fn last_week_start(&self) -> DateTime<Utc> {
        let midnight = self.last_week.and_time(NaiveTime::default());
        self.tz
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }

    /// Week an issue belongs to, or `None` if it is excluded from the digest.
    pub fn place(&self, issue: &RawIssue) -> Option<NaiveDate> {
        let category = StateCategory::from_name(&issue.state_name);
        if !category.is_reportable() {
            return None;
        }
        if category == StateCategory::Done {
            let week = week_start(issue.completed_at?, &self.tz);
            return (week == self.this_week || week == self.last_week).then_some(week);
        }
        match &issue.cycle {
            Some(cycle) if !cycle.is_current() => None,
            _ => Some(self.this_week),
        }
    }
}

// ---------------------------------------------------------------------------
// bucket()
// ---------------------------------------------------------------------------

/// Group issues into week buckets, ascending by week. Issue order within a
/// bucket follows input order; see [`crate::sort`].
pub fn bucket(issues: &[RawIssue], now: DateTime<Utc>, tz: FixedOffset) -> Vec<WeekBucket> {
    let window = WeekWindow::new(now, tz);
    let mut weeks: BTreeMap<NaiveDate, Vec<ProcessedIssue>> = BTreeMap::new();

    for issue in issues {
        match window.place(issue) {
            Some(week) => weeks
                .entry(week)
                .or_default()
                .push(ProcessedIssue::from_raw(issue)),
            None => tracing::debug!("excluding {} ({})", issue.identifier, issue.state_name),
        }
    }

    weeks
        .into_iter()
        .filter(|(_, issues)| !issues.is_empty())
        .map(|(week, issues)| WeekBucket { week, issues })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
