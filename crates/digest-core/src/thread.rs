use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Phrase that identifies the parent message of a weekly digest thread.
pub const DEFAULT_PHRASE: &str = "priorities for the week of";

/// A message from channel history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    #[serde(default)]
    pub text: String,
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl ChannelMessage {
    /// Top-level messages have no `thread_ts`, or one equal to their own `ts`
    /// (a thread parent). Replies point at a different parent.
    pub fn is_top_level(&self) -> bool {
        match &self.thread_ts {
            None => true,
            Some(thread_ts) => thread_ts == &self.ts,
        }
    }
}

/// Compile a thread pattern. Matching is always case-insensitive.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

/// Return the `ts` of the first top-level message whose text matches, in
/// the order supplied (newest first for Slack history).
pub fn find_thread(messages: &[ChannelMessage], pattern: &Regex) -> Option<String> {
    messages
        .iter()
        .filter(|m| m.is_top_level())
        .find(|m| pattern.is_match(&m.text))
        .map(|m| m.ts.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_pattern() -> Regex {
        compile_pattern(&regex::escape(DEFAULT_PHRASE)).unwrap()
    }

    fn msg(ts: &str, thread_ts: Option<&str>, text: &str) -> ChannelMessage {
        ChannelMessage {
            text: text.to_string(),
            ts: ts.to_string(),
            thread_ts: thread_ts.map(str::to_string),
        }
    }

    #[test]
    fn skips_replies_even_when_text_matches() {
        let messages = vec![
            msg("2", Some("1"), "priorities for the week of"),
            msg("3", None, "priorities for the week of"),
        ];
        assert_eq!(find_thread(&messages, &default_pattern()).as_deref(), Some("3"));
    }

    #[test]
    fn thread_parent_with_own_thread_ts_is_candidate() {
        let messages = vec![
            msg(
                "1234567890.123456",
                Some("1234567890.123456"),
                "Here are my priorities for the week of November 4th",
            ),
            msg("1234567891.123456", None, "Some other message"),
        ];
        assert_eq!(
            find_thread(&messages, &default_pattern()).as_deref(),
            Some("1234567890.123456")
        );
    }

    #[test]
    fn first_match_in_supplied_order_wins() {
        let messages = vec![
            msg("30", None, "My priorities for the week of Jan 13"),
            msg("20", None, "My priorities for the week of Jan 6"),
        ];
        assert_eq!(find_thread(&messages, &default_pattern()).as_deref(), Some("30"));
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        let messages = vec![msg("5", None, ">> PRIORITIES FOR THE WEEK OF jan 6 <<")];
        assert_eq!(find_thread(&messages, &default_pattern()).as_deref(), Some("5"));
    }

    #[test]
    fn no_match_returns_none() {
        let messages = vec![msg("1", None, "Some other message")];
        assert_eq!(find_thread(&messages, &default_pattern()), None);
        assert_eq!(find_thread(&[], &default_pattern()), None);
    }

    #[test]
    fn custom_patterns_compile_case_insensitive() {
        let pattern = compile_pattern(r"weekly (plan|update)").unwrap();
        let messages = vec![msg("9", None, "Weekly Update: all good")];
        assert_eq!(find_thread(&messages, &pattern).as_deref(), Some("9"));
        assert!(compile_pattern("(unclosed").is_err());
    }

    #[test]
    fn history_payload_deserializes() {
        let json = r#"[
            {"text": "priorities for the week of", "ts": "1.456", "thread_ts": "1.123"},
            {"ts": "1.789"}
        ]"#;
        let messages: Vec<ChannelMessage> = serde_json::from_str(json).unwrap();
        assert!(!messages[0].is_top_level());
        assert!(messages[1].is_top_level());
        assert_eq!(messages[1].text, "");
    }
}
