use crate::entity::Sender;
use serde::{Deserialize, Serialize};

pub const GREETING: &str = "Hi! I'm your Ayurveda personal doctor. How can I help you today?";
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't process that.";
pub const NETWORK_ERROR_FALLBACK: &str = "Network error. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }
}

/// Point-in-time copy of a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub messages: Vec<ChatMessage>,
    pub pending: bool,
}

impl ChatSession {
    /// A fresh session holding only the greeting.
    pub fn seeded() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            pending: false,
        }
    }
}

/// One row of the mood history panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodLogEntry {
    pub timestamp: String,
    pub mood: String,
    pub intensity: i64,
}
