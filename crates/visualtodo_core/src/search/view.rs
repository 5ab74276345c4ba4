//! Filter/search view model.

use crate::model::todo::Todo;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Trailing window used by the "this week" dashboard figure.
pub const RECENT_COMPLETION_WINDOW_DAYS: i64 = 7;

/// Completion filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl Display for TodoFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unsupported filter `{other}`; expected all|active|completed"
            )),
        }
    }
}

/// Filter plus free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub filter: TodoFilter,
    /// Case-insensitive substring; empty matches everything.
    pub text: String,
}

impl ViewQuery {
    pub fn new(filter: TodoFilter, text: impl Into<String>) -> Self {
        Self {
            filter,
            text: text.into(),
        }
    }
}

/// Returns the records visible under `query`, in collection order.
pub fn visible_todos<'a>(todos: &'a [Todo], query: &ViewQuery) -> Vec<&'a Todo> {
    let needle = query.text.to_lowercase();
    todos
        .iter()
        .filter(|todo| query.filter.matches(todo))
        .filter(|todo| needle.is_empty() || todo.text.to_lowercase().contains(&needle))
        .collect()
}

/// Summary counters for the header and filter labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub with_images: usize,
}

impl TodoStats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let completed = todos.iter().filter(|todo| todo.completed).count();
        Self {
            total: todos.len(),
            completed,
            active: todos.len() - completed,
            with_images: todos.iter().filter(|todo| todo.has_image()).count(),
        }
    }
}

/// Counts completions inside the trailing week ending at `now`.
pub fn recent_completions(todos: &[Todo], now: DateTime<Utc>) -> usize {
    let since = now - Duration::days(RECENT_COMPLETION_WINDOW_DAYS);
    todos
        .iter()
        .filter_map(|todo| todo.completed_at)
        .filter(|completed_at| *completed_at > since)
        .count()
}
