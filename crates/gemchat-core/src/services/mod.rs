pub mod attachment_service;
pub mod exchange;
pub mod gemini_client;

pub use attachment_service::{AttachmentError, normalize_attachments, text_label};
pub use exchange::{Connector, ExchangeChannel, Turn};
pub use gemini_client::GeminiConnector;
