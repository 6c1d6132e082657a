use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Placeholder shown while a narration has nothing displayable yet.
pub const THINKING_PLACEHOLDER: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    User,
    Game,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn new(message_type: MessageType, content: String) -> Self {
        Message {
            id: Uuid::new_v4(),
            message_type,
            content,
            timestamp: Local::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageType::User, content.into())
    }

    pub fn game(content: impl Into<String>) -> Self {
        Self::new(MessageType::Game, content.into())
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageType::System, content.into())
    }
}
