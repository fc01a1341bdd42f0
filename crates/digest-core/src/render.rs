//! Digest documents and their Slack Block Kit form.
//!
//! [`render`] turns a sorted [`WeekBucket`] into a [`Document`]: a header
//! with the week label and a body holding an ordered list of issues plus,
//! when anything is blocked, a sibling bullet list of the blockers.
//! [`Document::to_blocks`] serializes that into `header` + `rich_text`
//! blocks.

use crate::state::DisplaySymbol;
use crate::week::WeekBucket;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub header: Header,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Body {
    pub ordered_list: Vec<Entry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet_list: Option<Vec<Entry>>,
}

/// One list line: `<icon> <identifier link> - <title>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub symbol: DisplaySymbol,
    pub identifier: String,
    pub url: String,
    pub title: String,
}

impl Entry {
    fn inlines(&self, emoji: &EmojiSet) -> Vec<Inline> {
        vec![
            Inline::Emoji {
                name: emoji.name(self.symbol).to_string(),
            },
            Inline::Text {
                text: " ".to_string(),
            },
            self.identifier_inline(),
            Inline::Text {
                text: format!(" - {}", self.title),
            },
        ]
    }

    // Slack rejects link elements with an empty url.
    fn identifier_inline(&self) -> Inline {
        if self.url.trim().is_empty() {
            Inline::Text {
                text: self.identifier.clone(),
            }
        } else {
            Inline::Link {
                url: self.url.clone(),
                text: self.identifier.clone(),
            }
        }
    }
}

pub fn render(bucket: &WeekBucket) -> Document {
    let ordered_list = bucket
        .issues
        .iter()
        .map(|issue| Entry {
            symbol: issue.symbol,
            identifier: issue.identifier.clone(),
            url: issue.url.clone(),
            title: issue.title.clone(),
        })
        .collect();

    let blockers: Vec<Entry> = bucket
        .issues
        .iter()
        .flat_map(|issue| issue.blocked_by.iter())
        .map(|blocker| Entry {
            symbol: blocker.symbol(),
            identifier: blocker.identifier.clone(),
            url: blocker.url.clone(),
            title: blocker.title.clone(),
        })
        .collect();

    Document {
        header: Header {
            label: bucket.label(),
        },
        body: Body {
            ordered_list,
            bullet_list: (!blockers.is_empty()).then_some(blockers),
        },
    }
}

impl Document {
    pub fn to_blocks(&self, emoji: &EmojiSet) -> Vec<Block> {
        let section = |entry: &Entry| RichTextElement::RichTextSection {
            elements: entry.inlines(emoji),
        };

        let mut lists = vec![RichTextElement::RichTextList {
            style: ListStyle::Ordered,
            elements: self.body.ordered_list.iter().map(section).collect(),
        }];
        if let Some(bullets) = &self.body.bullet_list {
            lists.push(RichTextElement::RichTextList {
                style: ListStyle::Bullet,
                elements: bullets.iter().map(section).collect(),
            });
        }

        vec![
            Block::Header {
                text: TextObject::PlainText {
                    text: self.header.label.clone(),
                },
            },
            Block::RichText { elements: lists },
        ]
    }

    /// Console rendering used by dry runs.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.header.label);
        for (i, entry) in self.body.ordered_list.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} {} - {}",
                i + 1,
                entry.symbol.marker(),
                entry.identifier,
                entry.title
            );
        }
        if let Some(bullets) = &self.body.bullet_list {
            let _ = writeln!(out, "  Blocked by:");
            for entry in bullets {
                let _ = writeln!(
                    out,
                    "    - {} {} - {}",
                    entry.symbol.marker(),
                    entry.identifier,
                    entry.title
                );
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// EmojiSet
// ---------------------------------------------------------------------------

/// Slack emoji names for each display symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiSet {
    #[serde(default = "default_done")]
    pub done: String,
    #[serde(default = "default_in_progress")]
    pub in_progress: String,
    #[serde(default = "default_todo")]
    pub todo: String,
    #[serde(default = "default_blocked")]
    pub blocked: String,
}

fn default_done() -> String {
    DisplaySymbol::Done.default_emoji().to_string()
}

fn default_in_progress() -> String {
    DisplaySymbol::InProgress.default_emoji().to_string()
}

fn default_todo() -> String {
    DisplaySymbol::Todo.default_emoji().to_string()
}

fn default_blocked() -> String {
    DisplaySymbol::Blocked.default_emoji().to_string()
}

impl Default for EmojiSet {
    fn default() -> Self {
        Self {
            done: default_done(),
            in_progress: default_in_progress(),
            todo: default_todo(),
            blocked: default_blocked(),
        }
    }
}

impl EmojiSet {
    pub fn name(&self, symbol: DisplaySymbol) -> &str {
        match symbol {
            DisplaySymbol::Done => &self.done,
            DisplaySymbol::InProgress => &self.in_progress,
            DisplaySymbol::Todo => &self.todo,
            DisplaySymbol::Blocked => &self.blocked,
        }
    }
}

// ---------------------------------------------------------------------------
// Block Kit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: TextObject },
    RichText { elements: Vec<RichTextElement> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextElement {
    RichTextList {
        style: ListStyle,
        elements: Vec<RichTextElement>,
    },
    RichTextSection {
        elements: Vec<Inline>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Ordered,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Emoji { name: String },
    Text { text: String },
    Link { url: String, text: String },
}

/// A complete `chat.postMessage` payload minus channel and thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackMessage {
    pub text: String,
    pub blocks: Vec<Block>,
}

/// Concatenate the blocks of every document, in order.
pub fn render_message(documents: &[Document], emoji: &EmojiSet, fallback: &str) -> SlackMessage {
    SlackMessage {
        text: fallback.to_string(),
        blocks: documents
            .iter()
            .flat_map(|doc| doc.to_blocks(emoji))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{InverseRelation, ProcessedIssue, RawIssue};
    use chrono::NaiveDate;
    use serde_json::json;

    fn issue(identifier: &str, title: &str, state: &str) -> ProcessedIssue {
        let mut raw = RawIssue::new(identifier, title, state);
        raw.url = format!("https://linear.app/test/issue/{identifier}");
        ProcessedIssue::from_raw(&raw)
    }

    fn blocked(identifier: &str, blockers: &[(&str, &str)]) -> ProcessedIssue {
        let mut raw = RawIssue::new(identifier, format!("{identifier} title"), "In Progress");
        raw.url = format!("https://linear.app/test/issue/{identifier}");
        for (id, state) in blockers {
            raw.relations.push(InverseRelation {
                relation_type: Some("blocks".into()),
                issue: json!({
                    "identifier": id,
                    "title": format!("{id} title"),
                    "url": format!("https://linear.app/test/issue/{id}"),
                    "state": { "name": state }
                }),
            });
        }
        ProcessedIssue::from_raw(&raw)
    }

    fn bucket(issues: Vec<ProcessedIssue>) -> WeekBucket {
        WeekBucket {
            week: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            issues,
        }
    }

    #[test]
    fn document_has_header_and_ordered_list() {
        let doc = render(&bucket(vec![
            issue("TEST-1", "Test Issue", "Done"),
            issue("TEST-2", "Another Issue", "In Progress"),
        ]));
        assert_eq!(doc.header.label, "2026-01-05");
        assert_eq!(doc.body.ordered_list.len(), 2);
        assert!(doc.body.bullet_list.is_none());
    }

    #[test]
    fn blocks_match_slack_rich_text_shape() {
        let doc = render(&bucket(vec![
            issue("TEST-1", "Test Issue", "Done"),
            issue("TEST-2", "Another Issue", "In Progress"),
        ]));
        let value = serde_json::to_value(doc.to_blocks(&EmojiSet::default())).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(
            value[0],
            json!({ "type": "header", "text": { "type": "plain_text", "text": "2026-01-05" } })
        );

        let list = &value[1]["elements"][0];
        assert_eq!(value[1]["type"], "rich_text");
        assert_eq!(list["type"], "rich_text_list");
        assert_eq!(list["style"], "ordered");
        assert_eq!(list["elements"].as_array().unwrap().len(), 2);

        let first = &list["elements"][0];
        assert_eq!(first["type"], "rich_text_section");
        assert_eq!(
            first["elements"],
            json!([
                { "type": "emoji", "name": "done_linear" },
                { "type": "text", "text": " " },
                { "type": "link", "url": "https://linear.app/test/issue/TEST-1", "text": "TEST-1" },
                { "type": "text", "text": " - Test Issue" }
            ])
        );
        assert_eq!(list["elements"][1]["elements"][0]["name"], "in_progress_linear");
    }

    #[test]
    fn no_blocked_issues_means_exactly_one_list() {
        let doc = render(&bucket(vec![issue("A-1", "a", "Todo")]));
        let blocks = doc.to_blocks(&EmojiSet::default());
        let Block::RichText { elements } = &blocks[1] else {
            panic!("expected rich_text")
        };
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn blocked_issue_adds_sibling_bullet_list() {
        let doc = render(&bucket(vec![blocked("BLOCKED-1", &[("BLOCKER-1", "In Progress")])]));
        let value = serde_json::to_value(doc.to_blocks(&EmojiSet::default())).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 2);
        let lists = value[1]["elements"].as_array().unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0]["style"], "ordered");
        assert_eq!(lists[1]["style"], "bullet");

        assert_eq!(lists[0]["elements"][0]["elements"][0]["name"], "blocked_linear");
        assert_eq!(
            lists[1]["elements"][0]["elements"],
            json!([
                { "type": "emoji", "name": "in_progress_linear" },
                { "type": "text", "text": " " },
                {
                    "type": "link",
                    "url": "https://linear.app/test/issue/BLOCKER-1",
                    "text": "BLOCKER-1"
                },
                { "type": "text", "text": " - BLOCKER-1 title" }
            ])
        );
    }

    #[test]
    fn missing_urls_render_identifier_as_text() {
        let mut raw = RawIssue::new("A-1", "No link", "In Progress");
        raw.relations.push(InverseRelation {
            relation_type: Some("blocks".into()),
            issue: json!({
                "identifier": "B-1",
                "title": "Unlinked blocker",
                "state": { "name": "Todo" }
            }),
        });
        let doc = render(&bucket(vec![ProcessedIssue::from_raw(&raw)]));
        let value = serde_json::to_value(doc.to_blocks(&EmojiSet::default())).unwrap();

        let lists = value[1]["elements"].as_array().unwrap();
        assert_eq!(
            lists[0]["elements"][0]["elements"],
            json!([
                { "type": "emoji", "name": "blocked_linear" },
                { "type": "text", "text": " " },
                { "type": "text", "text": "A-1" },
                { "type": "text", "text": " - No link" }
            ])
        );
        assert_eq!(
            lists[1]["elements"][0]["elements"],
            json!([
                { "type": "emoji", "name": "todo_linear" },
                { "type": "text", "text": " " },
                { "type": "text", "text": "B-1" },
                { "type": "text", "text": " - Unlinked blocker" }
            ])
        );
        assert!(!serde_json::to_string(&value).unwrap().contains("\"link\""));
    }

    #[test]
    fn blockers_aggregate_in_issue_then_relation_order() {
        let doc = render(&bucket(vec![
            blocked("X-1", &[("B-2", "Todo"), ("B-1", "In Progress")]),
            issue("X-2", "free", "Todo"),
            blocked("X-3", &[("B-3", "Backlog"), ("B-4", "Done")]),
        ]));
        let bullets: Vec<_> = doc
            .body
            .bullet_list
            .unwrap()
            .into_iter()
            .map(|e| e.identifier)
            .collect();
        assert_eq!(bullets, vec!["B-2", "B-1", "B-3"]);
    }

    #[test]
    fn custom_emoji_names_are_used() {
        let emoji = EmojiSet {
            done: "white_check_mark".into(),
            ..EmojiSet::default()
        };
        let doc = render(&bucket(vec![issue("A-1", "a", "Done")]));
        let value = serde_json::to_value(doc.to_blocks(&emoji)).unwrap();
        assert_eq!(
            value[1]["elements"][0]["elements"][0]["elements"][0]["name"],
            "white_check_mark"
        );
    }

    #[test]
    fn message_concatenates_documents() {
        let docs = vec![
            render(&WeekBucket {
                week: NaiveDate::from_ymd_opt(2025, 12, 29).unwrap(),
                issues: vec![issue("OLD-1", "old", "Done")],
            }),
            render(&bucket(vec![issue("NEW-1", "new", "Todo")])),
        ];
        let message = render_message(&docs, &EmojiSet::default(), "Weekly priorities");
        assert_eq!(message.text, "Weekly priorities");
        assert_eq!(message.blocks.len(), 4);
        assert!(matches!(
            &message.blocks[0],
            Block::Header { text: TextObject::PlainText { text } } if text == "2025-12-29"
        ));
        assert!(matches!(
            &message.blocks[2],
            Block::Header { text: TextObject::PlainText { text } } if text == "2026-01-05"
        ));
    }

    #[test]
    fn plain_text_preview_lists_entries_and_blockers() {
        let doc = render(&bucket(vec![
            issue("TASK-3", "Done task", "Done"),
            blocked("TASK-2", &[("BLOCKER-1", "Todo")]),
        ]));
        let text = doc.to_plain_text();
        assert!(text.starts_with("2026-01-05\n"));
        assert!(text.contains("1. [x] TASK-3 - Done task"));
        assert!(text.contains("2. [!] TASK-2 - TASK-2 title"));
        assert!(text.contains("Blocked by:"));
        assert!(text.contains("[ ] BLOCKER-1 - BLOCKER-1 title"));
    }

    #[test]
    fn blocks_deserialize_back() {
        let doc = render(&bucket(vec![blocked("X-1", &[("B-1", "Todo")])]));
        let blocks = doc.to_blocks(&EmojiSet::default());
        let json = serde_json::to_string(&blocks).unwrap();
        let parsed: Vec<Block> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, blocks);
    }
}
