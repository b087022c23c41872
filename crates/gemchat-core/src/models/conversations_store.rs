use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::conversation::{Conversation, Message, Role};
use crate::repositories::ConversationRepository;

/// Durable mapping of conversation identity to message history.
///
/// The in-memory copy is authoritative. Every mutation rewrites the full
/// store through the repository while the lock is held, so concurrent
/// callers never interleave a read-modify-persist sequence.
pub struct ConversationsStore {
    repository: Arc<dyn ConversationRepository>,
    conversations: Mutex<Vec<Conversation>>,
}

impl ConversationsStore {
    /// Load the store from `repository`; an unreadable store starts empty
    pub fn load(repository: Arc<dyn ConversationRepository>) -> Self {
        let conversations = match repository.load_all() {
            Ok(conversations) => {
                info!(
                    count = conversations.len(),
                    path = %repository.storage_path(),
                    "Loaded conversations"
                );
                conversations
            }
            Err(e) => {
                warn!(
                    error = ?e,
                    path = %repository.storage_path(),
                    "Failed to load conversations, starting with an empty store"
                );
                Vec::new()
            }
        };

        Self {
            repository,
            conversations: Mutex::new(conversations),
        }
    }

    fn persist(&self, conversations: &[Conversation]) {
        if let Err(e) = self.repository.save_all(conversations) {
            error!(
                error = ?e,
                path = %self.repository.storage_path(),
                "Failed to save conversations"
            );
        }
    }

    /// Create an empty conversation and return its id
    pub fn create_conversation(&self, name: &str) -> String {
        let conversation = Conversation::new(name);
        let id = conversation.id().to_string();

        let mut conversations = self.conversations.lock();
        conversations.push(conversation);
        self.persist(&conversations);

        debug!(conv_id = %id, name = %name, "Created conversation");
        id
    }

    /// Delete a conversation and all of its messages. Returns false for unknown ids.
    pub fn delete_conversation(&self, id: &str) -> bool {
        let mut conversations = self.conversations.lock();
        let Some(index) = conversations.iter().position(|c| c.id() == id) else {
            return false;
        };

        conversations.remove(index);
        self.persist(&conversations);

        debug!(conv_id = %id, "Deleted conversation");
        true
    }

    pub fn get_conversation(&self, id: &str) -> Option<Conversation> {
        self.conversations.lock().iter().find(|c| c.id() == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.conversations.lock().iter().any(|c| c.id() == id)
    }

    /// Display names in store order
    pub fn list_names(&self) -> Vec<String> {
        self.conversations
            .lock()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// `(id, name)` pairs in store order
    pub fn entries(&self) -> Vec<(String, String)> {
        self.conversations
            .lock()
            .iter()
            .map(|c| (c.id().to_string(), c.name().to_string()))
            .collect()
    }

    /// Append a message. Unknown ids are ignored and return false.
    pub fn append_message(
        &self,
        id: &str,
        role: Role,
        content: &str,
        attachments: Vec<String>,
    ) -> bool {
        let mut conversations = self.conversations.lock();
        let Some(conversation) = conversations.iter_mut().find(|c| c.id() == id) else {
            debug!(conv_id = %id, "Ignoring message for unknown conversation");
            return false;
        };

        conversation.push_message(Message::new(role, content, attachments));
        self.persist(&conversations);
        true
    }

    /// Remove the newest message, used to roll back a failed exchange
    pub fn remove_last_message(&self, id: &str) -> Option<Message> {
        let mut conversations = self.conversations.lock();
        let removed = conversations
            .iter_mut()
            .find(|c| c.id() == id)
            .and_then(|c| c.pop_message())?;

        self.persist(&conversations);
        Some(removed)
    }

    /// Messages of a conversation in order; empty for unknown ids
    pub fn get_messages(&self, id: &str) -> Vec<Message> {
        self.conversations
            .lock()
            .iter()
            .find(|c| c.id() == id)
            .map(|c| c.messages().to_vec())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.conversations.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{ConversationJsonRepository, InMemoryConversationRepository};

    fn memory_store() -> (ConversationsStore, InMemoryConversationRepository) {
        let repo = InMemoryConversationRepository::new();
        let store = ConversationsStore::load(Arc::new(repo.clone()));
        (store, repo)
    }

    #[test]
    fn test_create_then_get() {
        let (store, repo) = memory_store();

        let id = store.create_conversation("Trip planning");
        let conversation = store.get_conversation(&id).unwrap();

        assert_eq!(conversation.name(), "Trip planning");
        assert_eq!(conversation.message_count(), 0);
        assert_eq!(repo.snapshot().len(), 1);
    }

    #[test]
    fn test_blank_names_are_accepted() {
        let (store, _) = memory_store();
        let id = store.create_conversation("   ");
        assert_eq!(store.get_conversation(&id).unwrap().name(), "   ");
    }

    #[test]
    fn test_append_preserves_call_order() {
        let (store, repo) = memory_store();
        let id = store.create_conversation("order");

        for i in 0..5 {
            let role = if i % 2 == 0 { Role::User } else { Role::Model };
            assert!(store.append_message(&id, role, &format!("m{}", i), Vec::new()));
        }

        let messages = store.get_messages(&id);
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m0", "m1", "m2", "m3", "m4"]);
        assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        // create + 5 appends
        assert_eq!(repo.save_count(), 6);
    }

    #[test]
    fn test_append_to_unknown_is_noop() {
        let (store, repo) = memory_store();
        assert!(!store.append_message("missing", Role::User, "hi", Vec::new()));
        assert!(store.get_messages("missing").is_empty());
        assert_eq!(repo.save_count(), 0);
    }

    #[test]
    fn test_remove_last_message() {
        let (store, _) = memory_store();
        let id = store.create_conversation("rollback");
        store.append_message(&id, Role::User, "m1", Vec::new());
        store.append_message(&id, Role::User, "m2", Vec::new());

        let removed = store.remove_last_message(&id).unwrap();
        assert_eq!(removed.content, "m2");

        let remaining = store.get_messages(&id);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "m1");
    }

    #[test]
    fn test_remove_last_message_on_empty_is_noop() {
        let (store, repo) = memory_store();
        let id = store.create_conversation("empty");
        let saves = repo.save_count();

        assert!(store.remove_last_message(&id).is_none());
        assert!(store.remove_last_message("missing").is_none());
        assert_eq!(repo.save_count(), saves);
    }

    #[test]
    fn test_delete_removes_conversation_and_name() {
        let (store, _) = memory_store();
        let keep = store.create_conversation("keep");
        let gone = store.create_conversation("gone");
        store.append_message(&gone, Role::User, "bye", Vec::new());

        assert!(store.delete_conversation(&gone));
        assert!(store.get_conversation(&gone).is_none());
        assert_eq!(store.list_names(), vec!["keep".to_string()]);
        assert!(store.get_conversation(&keep).is_some());

        assert!(!store.delete_conversation(&gone));
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let (store, repo) = memory_store();
        repo.set_fail_writes(true);

        let id = store.create_conversation("unsaved");
        store.append_message(&id, Role::User, "still here", Vec::new());

        assert_eq!(store.get_messages(&id).len(), 1);
        assert!(repo.snapshot().is_empty());
    }

    #[test]
    fn test_survives_restart() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chats.json");

        let id = {
            let store =
                ConversationsStore::load(Arc::new(ConversationJsonRepository::with_path(path.clone())));
            let id = store.create_conversation("persistent");
            store.append_message(&id, Role::User, "question", vec!["notes.md".to_string()]);
            store.append_message(&id, Role::Model, "answer", Vec::new());
            id
        };

        let reopened = ConversationsStore::load(Arc::new(ConversationJsonRepository::with_path(path)));
        let messages = reopened.get_messages(&id);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].attachments, vec!["notes.md".to_string()]);
        assert_eq!(messages[1].role, Role::Model);
    }

    #[test]
    fn test_corrupt_store_starts_empty_and_usable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chats.json");
        std::fs::write(&path, "{\"broken\": [").unwrap();

        let store = ConversationsStore::load(Arc::new(ConversationJsonRepository::with_path(path)));
        assert_eq!(store.count(), 0);

        let id = store.create_conversation("fresh start");
        assert!(store.append_message(&id, Role::User, "hello", Vec::new()));
        assert_eq!(store.list_names(), vec!["fresh start".to_string()]);
    }
}
