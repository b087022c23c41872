pub mod conversation_json_repository;
pub mod conversation_repository;
pub mod error;
pub mod in_memory_repository;
pub mod settings_json_repository;
pub mod settings_repository;

pub use conversation_json_repository::ConversationJsonRepository;
pub use conversation_repository::ConversationRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use in_memory_repository::InMemoryConversationRepository;
pub use settings_json_repository::SettingsJsonRepository;
pub use settings_repository::SettingsRepository;
