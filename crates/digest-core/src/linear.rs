//! Linear GraphQL client.
//!
//! Two queries make up a digest: issues completed since the start of last
//! week, and issues that are still open (started or unstarted). Results are
//! merged by issue id and normalized through [`crate::issue::parse_nodes`].

use crate::error::{DigestError, Result};
use crate::issue::{parse_nodes, RawIssue};
use crate::week::WeekWindow;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;

const ASSIGNED_ISSUES_QUERY: &str = r#"
query AssignedIssues($filter: IssueFilter) {
  viewer {
    id
    name
    assignedIssues(filter: $filter, first: 250) {
      nodes {
        id
        identifier
        title
        url
        estimate
        priority
        createdAt
        completedAt
        cycle { startsAt isActive isNext isPrevious }
        state { name }
        inverseRelations {
          nodes {
            type
            issue { identifier title url state { name } }
          }
        }
      }
    }
  }
}
"#;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which slice of the viewer's assigned issues to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueWindow {
    /// Issues completed at or after the given instant.
    CompletedSince(DateTime<Utc>),
    /// Issues in a started or unstarted state.
    Open,
}

impl IssueWindow {
    fn filter(&self) -> Value {
        match self {
            IssueWindow::CompletedSince(since) => json!({
                "completedAt": { "gte": since.to_rfc3339_opts(SecondsFormat::Secs, true) }
            }),
            IssueWindow::Open => json!({
                "state": { "type": { "in": ["started", "unstarted"] } }
            }),
        }
    }
}

pub struct LinearClient {
    http: Client,
    url: String,
}

impl LinearClient {
    pub fn new(api_key: &str, url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        // Personal API keys go in the header as-is, without a Bearer prefix.
        let auth = HeaderValue::from_str(api_key.trim()).map_err(|_| {
            DigestError::InvalidConfig("LINEAR_API_KEY is not a valid header".into())
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    /// POST a GraphQL document and return the response body.
    ///
    /// An empty or non-JSON body is treated as an empty object rather than
    /// an error; a top-level `errors` array is surfaced as
    /// [`DigestError::LinearGraphql`].
    pub fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(DigestError::LinearStatus {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Linear returned an unreadable body: {e}");
                return Ok(Value::Object(Default::default()));
            }
        };

        if let Some(errors) = value.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect();
                let joined = if messages.is_empty() {
                    "unknown error".to_string()
                } else {
                    messages.join("; ")
                };
                return Err(DigestError::LinearGraphql(joined));
            }
        }
        Ok(value)
    }

    /// Fetch the raw `assignedIssues.nodes` array for one window.
    pub fn fetch_assigned_issues(&self, window: IssueWindow) -> Result<Vec<Value>> {
        let body = self.execute(ASSIGNED_ISSUES_QUERY, json!({ "filter": window.filter() }))?;

        let viewer = body
            .get("data")
            .and_then(|d| d.get("viewer"))
            .filter(|v| v.is_object())
            .ok_or(DigestError::NoData)?;

        let nodes = viewer
            .get("assignedIssues")
            .and_then(|a| a.get("nodes"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        tracing::debug!("{window:?}: {} issue(s)", nodes.len());
        Ok(nodes)
    }

    /// Fetch both digest windows relative to `now` and normalize the union.
    pub fn fetch_digest_issues(
        &self,
        now: DateTime<Utc>,
        tz: FixedOffset,
    ) -> Result<Vec<RawIssue>> {
        let window = WeekWindow::new(now, tz);
        let completed = self.fetch_assigned_issues(IssueWindow::CompletedSince(
            window.last_week_start(),
        ))?;
        let open = self.fetch_assigned_issues(IssueWindow::Open)?;

        let mut nodes = completed;
        nodes.extend(open);
        Ok(dedupe(parse_nodes(&nodes, &tz)))
    }
}

/// Keep the first occurrence of each issue id.
pub fn dedupe(issues: Vec<RawIssue>) -> Vec<RawIssue> {
    let mut seen = HashSet::new();
    issues
        .into_iter()
        .filter(|issue| seen.insert(issue.id.clone()))
        .collect()
}
