//! Conversation domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Titles longer than this are truncated for display.
pub const TITLE_DISPLAY_LIMIT: usize = 30;

/// A conversation thread as returned by the server.
///
/// The server owns ordering (newest-first) and mutates `title` and
/// `updated_at` after each exchange; the client never re-sorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Display form of the title: at most [`TITLE_DISPLAY_LIMIT`] chars,
    /// longer titles become the first 27 chars plus `...`.
    pub fn display_title(&self) -> String {
        truncate_title(&self.title)
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_DISPLAY_LIMIT {
        let head: String = title.chars().take(TITLE_DISPLAY_LIMIT - 3).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

/// Derives a title for an implicitly-created conversation from the first
/// message's text.
pub fn title_from_message(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "New Chat".to_string();
    }
    trimmed.chars().take(TITLE_DISPLAY_LIMIT).collect()
}
