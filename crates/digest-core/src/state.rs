use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// StateCategory
// ---------------------------------------------------------------------------

/// Normalized classification of an issue's free-text workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCategory {
    Done,
    InProgress,
    Todo,
    Backlog,
    Other,
}

impl StateCategory {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Done" => StateCategory::Done,
            "In Progress" => StateCategory::InProgress,
            "Todo" => StateCategory::Todo,
            "Backlog" => StateCategory::Backlog,
            _ => StateCategory::Other,
        }
    }

    /// Sort rank within a week bucket. Only the three reportable categories
    /// ever reach the sorter; the rest rank last.
    pub fn rank(self) -> u8 {
        match self {
            StateCategory::Done => 0,
            StateCategory::InProgress => 1,
            StateCategory::Todo => 2,
            StateCategory::Backlog | StateCategory::Other => 3,
        }
    }

    /// Whether issues in this category can appear in a digest at all.
    pub fn is_reportable(self) -> bool {
        matches!(
            self,
            StateCategory::Done | StateCategory::InProgress | StateCategory::Todo
        )
    }

    pub fn symbol(self) -> DisplaySymbol {
        match self {
            StateCategory::Done => DisplaySymbol::Done,
            StateCategory::InProgress => DisplaySymbol::InProgress,
            StateCategory::Todo | StateCategory::Backlog | StateCategory::Other => {
                DisplaySymbol::Todo
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DisplaySymbol
// ---------------------------------------------------------------------------

/// The icon shown next to an issue. `Blocked` is never produced by
/// [`classify`]; it is applied once active blockers are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplaySymbol {
    Done,
    InProgress,
    Todo,
    Blocked,
}

impl DisplaySymbol {
    pub fn all() -> &'static [DisplaySymbol] {
        &[
            DisplaySymbol::Done,
            DisplaySymbol::InProgress,
            DisplaySymbol::Todo,
            DisplaySymbol::Blocked,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisplaySymbol::Done => "done",
            DisplaySymbol::InProgress => "in_progress",
            DisplaySymbol::Todo => "todo",
            DisplaySymbol::Blocked => "blocked",
        }
    }

    /// Emoji name used when no override is configured.
    pub fn default_emoji(self) -> &'static str {
        match self {
            DisplaySymbol::Done => "done_linear",
            DisplaySymbol::InProgress => "in_progress_linear",
            DisplaySymbol::Todo => "todo_linear",
            DisplaySymbol::Blocked => "blocked_linear",
        }
    }

    /// Plain-text marker for console previews.
    pub fn marker(self) -> &'static str {
        match self {
            DisplaySymbol::Done => "[x]",
            DisplaySymbol::InProgress => "[~]",
            DisplaySymbol::Todo => "[ ]",
            DisplaySymbol::Blocked => "[!]",
        }
    }
}

impl fmt::Display for DisplaySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

pub fn classify(state_name: &str) -> (StateCategory, DisplaySymbol) {
    let category = StateCategory::from_name(state_name);
    (category, category.symbol())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
