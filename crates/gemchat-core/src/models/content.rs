/// A typed piece of outgoing turn content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentUnit {
    Text(String),
    Image { mime_type: &'static str, data: Vec<u8> },
}

impl ContentUnit {
    pub fn is_image(&self) -> bool {
        matches!(self, ContentUnit::Image { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentUnit::Text(text) => Some(text),
            ContentUnit::Image { .. } => None,
        }
    }
}
