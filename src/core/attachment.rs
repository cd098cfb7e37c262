//! Image attachments carried as `data:` URIs.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// MIME type sent to the generation API for every attachment, whatever the
/// file actually contains.
pub const ASSUMED_IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug)]
pub enum AttachmentError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Empty(PathBuf),
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentError::Read { path, source } => {
                write!(f, "Failed to read image {}: {}", path.display(), source)
            }
            AttachmentError::Empty(path) => write!(f, "Image {} is empty", path.display()),
        }
    }
}

impl StdError for AttachmentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AttachmentError::Read { source, .. } => Some(source),
            AttachmentError::Empty(_) => None,
        }
    }
}

/// Read an image file and encode it as a base64 `data:` URI.
pub fn read_image_as_data_uri(path: &Path) -> Result<String, AttachmentError> {
    let bytes = fs::read(path).map_err(|source| AttachmentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AttachmentError::Empty(path.to_path_buf()));
    }
    Ok(encode_data_uri(guess_mime(path), &bytes))
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// The base64 payload of a `data:` URI: everything after the first comma.
pub fn data_uri_payload(uri: &str) -> &str {
    uri.split_once(',').map(|(_, payload)| payload).unwrap_or("")
}

fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
