use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::message::{new_id, Message};
use crate::core::persona::Persona;

pub const DEFAULT_SESSION_TITLE: &str = "New Conversation";
pub const TITLE_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub persona: Persona,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(persona: Persona) -> Self {
        Self {
            id: new_id(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            persona,
            messages: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Append a user message. The first message of a session names it.
    pub fn push_user_message(&mut self, message: Message) {
        let is_first = self.messages.is_empty();
        if is_first {
            if let Some(title) = derive_title(&message.content) {
                self.title = title;
            }
        }
        self.messages.push(message);
    }
}

/// Title for a session whose first message is `content`: the first 30
/// characters, followed by `...` when the message is longer. Blank content
/// (an image-only message) yields no title.
pub fn derive_title(content: &str) -> Option<String> {
    if content.trim().is_empty() {
        return None;
    }

    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{head}..."))
    } else {
        Some(head)
    }
}
