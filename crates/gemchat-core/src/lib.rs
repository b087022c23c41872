//! Conversation state and session management for the gemchat chat client.
//!
//! The crate owns chat identity, durable message history, attachment
//! normalization and the send/receive transaction against the Gemini API.
//! Presentation is left to the caller, which drives everything through
//! [`controllers::AppController`].

pub mod controllers;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use controllers::{AppController, Intent, Outcome, SendOutcome, SessionController};
pub use error::{ChatError, ChatResult, ExchangeError};
pub use models::{ChatDirectory, Conversation, ConversationsStore, GenerationConfig, Message, Role};
pub use settings::AppConfig;
