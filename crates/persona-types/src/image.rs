//! In-memory encoded images.
//!
//! Images travel between the client and the image-generation service as a
//! base64 payload plus a MIME type, so that is the canonical form here too.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// MIME types accepted for upload and expected back from the image service.
pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("image payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("image is empty")]
    Empty,
}

/// A base64-encoded image and its MIME type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

impl EncodedImage {
    /// Encodes raw bytes.
    ///
    /// The MIME type must be one of [`SUPPORTED_MIME_TYPES`].
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Result<Self, ImageError> {
        let mime_type = mime_type.into();
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if !SUPPORTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(ImageError::UnsupportedType(mime_type));
        }
        Ok(Self {
            data: STANDARD.encode(bytes),
            mime_type,
        })
    }

    /// Decodes the payload back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ImageError> {
        Ok(STANDARD.decode(self.data.as_bytes())?)
    }

    /// Size of the decoded image in bytes, computed from the base64 length.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        ((self.data.len() / 4) * 3).saturating_sub(padding.min(2))
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        extension_for(&self.mime_type)
    }
}

// Payloads run to megabytes; keep them out of logs.
impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type)
            .field("data", &format_args!("<{} base64 chars>", self.data.len()))
            .finish()
    }
}

/// Determines file extension from content type.
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Detects content type from the first bytes of a file.
pub fn detect_mime(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        Some("image/jpeg")
    } else if data.len() >= 8 && data[..8] == [137, 80, 78, 71, 13, 10, 26, 10] {
        Some("image/png")
    } else if data.len() >= 4 && &data[..4] == b"GIF8" {
        Some("image/gif")
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Guesses the content type from a file name.
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
