pub mod chat_directory;
pub mod content;
pub mod conversation;
pub mod conversations_store;
pub mod generation_config;
pub mod timestamp;

pub use chat_directory::ChatDirectory;
pub use content::ContentUnit;
pub use conversation::{Conversation, Message, Role};
pub use conversations_store::ConversationsStore;
pub use generation_config::{
    GenerationConfig, HarmBlockThreshold, HarmCategory, SafetySetting, SessionParams,
};
pub use timestamp::Timestamp;
