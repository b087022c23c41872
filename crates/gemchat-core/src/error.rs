use thiserror::Error;

/// Failures of a single request/response exchange with the remote model.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Nothing to send: no attachment could be read")]
    EmptyTurn,
}

/// Errors surfaced to the caller of the core.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No API key configured. Add one in the settings.")]
    NotConfigured,

    #[error("Failed to create chat session: {0}")]
    SessionCreation(String),

    #[error("Communication error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("A message is already being sent")]
    Busy,

    #[error("No session is bound to conversation {conversation_id}")]
    NotBound { conversation_id: String },

    #[error("Unknown conversation: {0}")]
    UnknownConversation(String),

    #[error("No conversation selected")]
    NoActiveConversation,
}

pub type ChatResult<T> = Result<T, ChatError>;
