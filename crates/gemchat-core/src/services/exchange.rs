use crate::error::{ChatResult, ExchangeError};
use crate::models::{ContentUnit, Role, SessionParams};

/// One completed turn as the remote model sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<ContentUnit>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<ContentUnit>) -> Self {
        Self { role, parts }
    }

    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self::new(role, vec![ContentUnit::Text(text.into())])
    }
}

/// A live request/response channel to the remote model.
///
/// Calls block until the remote side answers or the channel's own timeout
/// expires.
pub trait ExchangeChannel: Send {
    fn exchange(&self, history: &[Turn], turn: &[ContentUnit]) -> Result<String, ExchangeError>;
}

/// Opens exchange channels for a set of session parameters
pub trait Connector: Send + Sync {
    fn connect(&self, params: &SessionParams) -> ChatResult<Box<dyn ExchangeChannel>>;
}
