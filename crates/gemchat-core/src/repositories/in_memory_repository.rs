use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::conversation_repository::ConversationRepository;
use super::error::{RepositoryError, RepositoryResult};
use crate::models::Conversation;

/// In-memory repository for conversations
/// Useful for testing and development
#[derive(Clone, Default)]
pub struct InMemoryConversationRepository {
    conversations: Arc<Mutex<Vec<Conversation>>>,
    fail_writes: Arc<AtomicBool>,
    save_count: Arc<AtomicUsize>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of conversations
    pub fn with_conversations(conversations: Vec<Conversation>) -> Self {
        let repo = Self::new();
        *repo.conversations.lock() = conversations;
        repo
    }

    /// Make every subsequent save fail with an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// What a fresh load would return right now
    pub fn snapshot(&self) -> Vec<Conversation> {
        self.conversations.lock().clone()
    }
}

impl ConversationRepository for InMemoryConversationRepository {
    fn load_all(&self) -> RepositoryResult<Vec<Conversation>> {
        Ok(self.conversations.lock().clone())
    }

    fn save_all(&self, conversations: &[Conversation]) -> RepositoryResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::IoError(std::io::Error::other(
                "simulated write failure",
            )));
        }

        *self.conversations.lock() = conversations.to_vec();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn storage_path(&self) -> String {
        "<memory>".to_string()
    }
}
