use chrono::Local;
use serde::{Deserialize, Serialize};

use super::timestamp::{self, Timestamp};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// A single turn in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(with = "timestamp")]
    pub timestamp: Timestamp,
    /// Paths of files sent with this turn, kept for display only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, attachments: Vec<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Local::now(),
            attachments,
        }
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// A named, persisted sequence of messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    id: String,
    name: String,
    #[serde(with = "timestamp")]
    created_at: Timestamp,
    #[serde(default)]
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation with a fresh identity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: Local::now(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Append a message, clamping its timestamp so history never goes back in time
    pub(crate) fn push_message(&mut self, mut message: Message) {
        if let Some(last) = self.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.messages.push(message);
    }

    pub(crate) fn pop_message(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    /// The storage key is authoritative when it disagrees with the stored id
    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
