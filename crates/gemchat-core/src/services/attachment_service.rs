//! Attachment normalization
//!
//! Turns the file paths picked for a turn into content units. Known raster
//! images are sent as binary with their media type, everything else is read
//! as UTF-8 text and labelled with its file name.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::models::ContentUnit;

pub const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
];

#[derive(Debug, Error)]
#[error("Failed to read attachment {path}: {source}")]
pub struct AttachmentError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

/// Media type for a path with a known image extension
pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, mime)| *mime)
}

/// Label prepended to inlined text files
pub fn text_label(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    format!("[File: {}]", file_name)
}

/// Convert one path into a content unit
pub fn load_attachment(path: &Path) -> Result<ContentUnit, AttachmentError> {
    let to_error = |source| AttachmentError {
        path: path.to_string_lossy().to_string(),
        source,
    };

    match image_mime_type(path) {
        Some(mime_type) => {
            let data = std::fs::read(path).map_err(to_error)?;
            Ok(ContentUnit::Image { mime_type, data })
        }
        None => {
            let text = std::fs::read_to_string(path).map_err(to_error)?;
            Ok(ContentUnit::Text(format!("{}\n{}", text_label(path), text)))
        }
    }
}

/// Convert paths in order, skipping (and logging) any that cannot be read
pub fn normalize_attachments<P: AsRef<Path>>(paths: &[P]) -> Vec<ContentUnit> {
    paths
        .iter()
        .filter_map(|path| match load_attachment(path.as_ref()) {
            Ok(unit) => Some(unit),
            Err(e) => {
                warn!(error = %e, "Skipping attachment");
                None
            }
        })
        .collect()
}
