use crate::issue::InverseRelation;
use crate::state::{classify, DisplaySymbol, StateCategory};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

const BLOCKS: &str = "blocks";

// ---------------------------------------------------------------------------
// Blocker
// ---------------------------------------------------------------------------

/// An unresolved issue that blocks a digest entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Blocker {
    pub identifier: String,
    pub title: String,
    pub url: String,
    pub state_name: String,
}

impl Blocker {
    /// The blocker's own display symbol, derived from its state name.
    pub fn symbol(&self) -> DisplaySymbol {
        classify(&self.state_name).1
    }
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

/// Why a relation entry did not produce an active blocker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotBlocking,
    MissingIssue,
    IssueNotObject,
    MissingField(&'static str),
    Resolved,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotBlocking => f.write_str("not a blocking relation"),
            Rejection::MissingIssue => f.write_str("relation has no issue"),
            Rejection::IssueNotObject => f.write_str("relation issue is not an object"),
            Rejection::MissingField(name) => write!(f, "relation issue is missing '{name}'"),
            Rejection::Resolved => f.write_str("blocker is already done"),
        }
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project one relation entry into an active blocker.
pub fn parse_blocker(relation: &InverseRelation) -> Result<Blocker, Rejection> {
    if relation.relation_type.as_deref() != Some(BLOCKS) {
        return Err(Rejection::NotBlocking);
    }

    let issue = match &relation.issue {
        Value::Null => return Err(Rejection::MissingIssue),
        Value::Object(map) => map,
        _ => return Err(Rejection::IssueNotObject),
    };

    let field = |name: &'static str| -> Result<String, Rejection> {
        issue
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(Rejection::MissingField(name))
    };

    let identifier = field("identifier")?;
    let title = field("title")?;
    let url = field("url").unwrap_or_default();
    let state_name = issue
        .get("state")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(Rejection::MissingField("state"))?;

    if classify(&state_name).0 == StateCategory::Done {
        return Err(Rejection::Resolved);
    }

    Ok(Blocker {
        identifier,
        title,
        url,
        state_name,
    })
}

/// Collect the active blockers of an issue, in relation order.
///
/// Malformed entries are dropped, never reported as errors.
pub fn resolve_blockers(relations: &[InverseRelation]) -> Vec<Blocker> {
    relations
        .iter()
        .filter_map(|relation| match parse_blocker(relation) {
            Ok(blocker) => Some(blocker),
            Err(reason) => {
                if reason != Rejection::NotBlocking && reason != Rejection::Resolved {
                    tracing::debug!("ignoring relation: {reason}");
                }
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
