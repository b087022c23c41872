use crate::models::Conversation;

use super::error::RepositoryResult;

/// Repository trait for conversation persistence.
///
/// The whole store is read at startup and rewritten on every mutation, so
/// the trait deals in complete, ordered snapshots rather than single rows.
pub trait ConversationRepository: Send + Sync + 'static {
    /// Load every conversation in storage order
    fn load_all(&self) -> RepositoryResult<Vec<Conversation>>;

    /// Replace the stored document with `conversations`
    fn save_all(&self, conversations: &[Conversation]) -> RepositoryResult<()>;

    /// Human-readable location, used in log output
    fn storage_path(&self) -> String;
}
