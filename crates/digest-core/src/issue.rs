//! Normalization of Linear issue payloads.
//!
//! Every piece of loosely-typed tracker data passes through [`parse_nodes`]
//! before any bucketing or rendering logic sees it. Nodes that lack the
//! fields a digest entry needs are dropped here; nested relation entries are
//! kept as raw JSON and validated later by [`crate::blocking`].

use crate::blocking::{resolve_blockers, Blocker};
use crate::state::{classify, DisplaySymbol, StateCategory};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueNode {
    #[serde(default)]
    id: Option<String>,
    identifier: String,
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    estimate: Option<f64>,
    #[serde(default)]
    priority: Option<f64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    completed_at: Option<String>,
    #[serde(default)]
    state: Option<StateNode>,
    #[serde(default)]
    cycle: Option<CycleNode>,
    #[serde(default)]
    inverse_relations: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct StateNode {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CycleNode {
    #[serde(default)]
    starts_at: Option<String>,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    is_next: bool,
    #[serde(default)]
    is_previous: bool,
}

// ---------------------------------------------------------------------------
// RawIssue
// ---------------------------------------------------------------------------

/// A tracker cycle (sprint) the issue is assigned to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cycle {
    pub starts_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_next: bool,
    pub is_previous: bool,
}

impl Cycle {
    /// True when the cycle is the active one or directly adjacent to it.
    pub fn is_current(&self) -> bool {
        self.is_active || self.is_next || self.is_previous
    }
}

/// One entry of an issue's `inverseRelations` connection. `issue` is left
/// as raw JSON (possibly `Null`) because the tracker does not guarantee its
/// shape.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseRelation {
    pub relation_type: Option<String>,
    pub issue: Value,
}

impl InverseRelation {
    fn from_value(value: &Value) -> Self {
        Self {
            relation_type: value
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string),
            issue: value.get("issue").cloned().unwrap_or(Value::Null),
        }
    }
}

/// An issue after normalization: timestamps parsed, optional fields
/// defaulted, relations flattened out of their GraphQL connection.
#[derive(Debug, Clone, PartialEq)]
pub struct RawIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub url: String,
    pub estimate: Option<f64>,
    pub priority: u8,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub state_name: String,
    pub cycle: Option<Cycle>,
    pub relations: Vec<InverseRelation>,
}

impl RawIssue {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        state_name: impl Into<String>,
    ) -> Self {
        let identifier = identifier.into();
        Self {
            id: identifier.clone(),
            url: String::new(),
            identifier,
            title: title.into(),
            estimate: None,
            priority: 0,
            created_at: None,
            completed_at: None,
            state_name: state_name.into(),
            cycle: None,
            relations: Vec::new(),
        }
    }

    fn from_node(node: IssueNode, tz: &FixedOffset) -> Self {
        let relations = relation_nodes(&node.inverse_relations)
            .iter()
            .map(InverseRelation::from_value)
            .collect();

        Self {
            id: node.id.unwrap_or_else(|| node.identifier.clone()),
            identifier: node.identifier,
            title: node.title,
            url: node.url.unwrap_or_default(),
            estimate: node.estimate,
            priority: node.priority.map(priority_from_f64).unwrap_or(0),
            created_at: node.created_at.as_deref().and_then(|s| parse_timestamp(s, tz)),
            completed_at: node
                .completed_at
                .as_deref()
                .and_then(|s| parse_timestamp(s, tz)),
            state_name: node.state.map(|s| s.name).unwrap_or_default(),
            cycle: node.cycle.map(|c| Cycle {
                starts_at: c.starts_at.as_deref().and_then(|s| parse_timestamp(s, tz)),
                is_active: c.is_active,
                is_next: c.is_next,
                is_previous: c.is_previous,
            }),
            relations,
        }
    }
}

// Linear exposes priority as a GraphQL Float.
fn priority_from_f64(value: f64) -> u8 {
    value.clamp(0.0, f64::from(u8::MAX)) as u8
}

/// Accept either `{"nodes": [...]}` or a bare array; anything else is empty.
fn relation_nodes(value: &Value) -> Vec<Value> {
    let nodes = match value {
        Value::Object(map) => map.get("nodes"),
        Value::Array(_) => Some(value),
        _ => None,
    };
    match nodes {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Normalize the `assignedIssues.nodes` array of a Linear response.
///
/// Nodes that cannot supply an identifier and title are skipped with a
/// warning; they could not be rendered anyway.
pub fn parse_nodes(nodes: &[Value], tz: &FixedOffset) -> Vec<RawIssue> {
    nodes
        .iter()
        .filter_map(|node| match serde_json::from_value::<IssueNode>(node.clone()) {
            Ok(parsed) => Some(RawIssue::from_node(parsed, tz)),
            Err(e) => {
                tracing::warn!("skipping malformed issue node: {e}");
                None
            }
        })
        .collect()
}

/// Parse a tracker timestamp. RFC 3339 strings carry their own offset;
/// naive `YYYY-MM-DDTHH:MM:SS[.fff]` strings are read in `tz`.
pub fn parse_timestamp(s: &str, tz: &FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => tz
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        Err(_) => {
            tracing::debug!("unparseable timestamp '{s}'");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessedIssue
// ---------------------------------------------------------------------------

/// A digest entry: a reportable issue with its display state resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedIssue {
    pub identifier: String,
    pub title: String,
    pub url: String,
    pub estimate: Option<f64>,
    pub priority: u8,
    pub state_name: String,
    pub category: StateCategory,
    pub symbol: DisplaySymbol,
    pub blocked_by: Vec<Blocker>,
}

impl ProcessedIssue {
    pub fn from_raw(raw: &RawIssue) -> Self {
        let (category, symbol) = classify(&raw.state_name);
        let blocked_by = resolve_blockers(&raw.relations);
        let symbol = if blocked_by.is_empty() {
            symbol
        } else {
            DisplaySymbol::Blocked
        };

        Self {
            identifier: raw.identifier.clone(),
            title: raw.title.clone(),
            url: raw.url.clone(),
            estimate: raw.estimate,
            priority: raw.priority,
            state_name: raw.state_name.clone(),
            category,
            symbol,
            blocked_by,
        }
    }

    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn parses_full_node() {
        let nodes = vec![json!({
            "id": "issue-1",
            "identifier": "TEST-1",
            "title": "Test Issue 1",
            "url": "https://linear.app/test/issue/TEST-1",
            "estimate": 3,
            "priority": 1,
            "createdAt": "2025-11-01T10:00:00Z",
            "completedAt": null,
            "cycle": {
                "startsAt": "2025-11-04T00:00:00Z",
                "isActive": true,
                "isNext": false,
                "isPrevious": false
            },
            "state": { "name": "In Progress" }
        })];

        let issues = parse_nodes(&nodes, &utc());
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.id, "issue-1");
        assert_eq!(issue.identifier, "TEST-1");
        assert_eq!(issue.estimate, Some(3.0));
        assert_eq!(issue.priority, 1);
        assert_eq!(issue.state_name, "In Progress");
        assert!(issue.completed_at.is_none());
        assert!(issue.cycle.as_ref().unwrap().is_current());
        assert!(issue.relations.is_empty());
    }

    #[test]
    fn missing_optional_fields_default() {
        let nodes = vec![json!({
            "identifier": "TASK-1",
            "title": "Task without estimate",
            "state": { "name": "Todo" }
        })];

        let issues = parse_nodes(&nodes, &utc());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "TASK-1");
        assert_eq!(issues[0].estimate, None);
        assert_eq!(issues[0].priority, 0);
        assert_eq!(issues[0].url, "");
        assert!(issues[0].cycle.is_none());
    }

    #[test]
    fn node_without_identifier_is_skipped() {
        let nodes = vec![
            json!({ "title": "orphan", "state": { "name": "Todo" } }),
            json!("not an object"),
            json!({ "identifier": "OK-1", "title": "fine" }),
        ];
        let issues = parse_nodes(&nodes, &utc());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].identifier, "OK-1");
    }

    #[test]
    fn null_and_malformed_relations_become_empty() {
        let nodes = vec![
            json!({ "identifier": "A-1", "title": "a", "inverseRelations": null }),
            json!({ "identifier": "A-2", "title": "b", "inverseRelations": "nope" }),
            json!({ "identifier": "A-3", "title": "c", "inverseRelations": { "nodes": 7 } }),
        ];
        let issues = parse_nodes(&nodes, &utc());
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.relations.is_empty()));
    }

    #[test]
    fn relation_entries_keep_raw_issue_payload() {
        let nodes = vec![json!({
            "identifier": "A-1",
            "title": "a",
            "inverseRelations": { "nodes": [
                { "type": "blocks" },
                { "type": "blocks", "issue": "not-an-array" }
            ]}
        })];
        let issues = parse_nodes(&nodes, &utc());
        let relations = &issues[0].relations;
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[0].relation_type.as_deref(), Some("blocks"));
        assert_eq!(relations[0].issue, Value::Null);
        assert_eq!(relations[1].issue, json!("not-an-array"));
    }

    #[test]
    fn timestamps_with_and_without_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();

        let zulu = parse_timestamp("2026-01-05T00:00:00Z", &tz).unwrap();
        assert_eq!(zulu.to_rfc3339(), "2026-01-05T00:00:00+00:00");

        let millis = parse_timestamp("2026-01-05T10:30:00.123Z", &tz).unwrap();
        assert_eq!(millis.timestamp_subsec_millis(), 123);

        // Naive timestamps are local to the reference timezone.
        let naive = parse_timestamp("2026-01-05T00:00:00", &tz).unwrap();
        assert_eq!(naive.to_rfc3339(), "2026-01-04T22:00:00+00:00");

        assert!(parse_timestamp("yesterday", &tz).is_none());
        assert!(parse_timestamp("", &tz).is_none());
    }

    #[test]
    fn unparseable_completion_is_treated_as_missing() {
        let nodes = vec![json!({
            "identifier": "D-1",
            "title": "done",
            "completedAt": "garbage",
            "state": { "name": "Done" }
        })];
        let issues = parse_nodes(&nodes, &utc());
        assert!(issues[0].completed_at.is_none());
    }

    #[test]
    fn processed_issue_keeps_long_titles_verbatim() {
        let title = "Very long issue title ".repeat(50);
        let raw = RawIssue::new("LONG-1", title.clone(), "Todo");
        let processed = ProcessedIssue::from_raw(&raw);
        assert_eq!(processed.title, title);
        assert_eq!(processed.symbol, DisplaySymbol::Todo);
        assert!(!processed.is_blocked());
    }
}
