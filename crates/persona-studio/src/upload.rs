//! Reading photos from disk and writing generated avatars back.

use persona_types::{detect_mime, mime_from_extension, EncodedImage, ImageError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum upload file size: 10 MiB.
pub const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file is too large: {size} bytes (limit: {max} bytes)", max = MAX_UPLOAD_SIZE)]
    TooLarge { size: u64 },

    #[error("{} is not a JPEG, PNG, GIF or WebP image", .0.display())]
    UnsupportedType(PathBuf),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Reads a local image into its encoded form.
///
/// The type is sniffed from the file's magic bytes, falling back to its
/// extension.
pub async fn read_image(path: &Path) -> Result<EncodedImage, UploadError> {
    let read_err = |source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(read_err)?.len();
    if size > MAX_UPLOAD_SIZE {
        return Err(UploadError::TooLarge { size });
    }

    let bytes = tokio::fs::read(path).await.map_err(read_err)?;
    let mime = detect_mime(&bytes)
        .or_else(|| mime_from_extension(path))
        .ok_or_else(|| UploadError::UnsupportedType(path.to_path_buf()))?;

    tracing::debug!(path = %path.display(), mime, size, "read image");
    Ok(EncodedImage::from_bytes(&bytes, mime)?)
}

/// Writes `image` to `path`, appending the matching extension when `path`
/// has none. Returns the path written.
pub async fn write_image(path: &Path, image: &EncodedImage) -> Result<PathBuf, UploadError> {
    let target = if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(image.extension())
    };

    let bytes = image.decode()?;
    tokio::fs::write(&target, bytes)
        .await
        .map_err(|source| UploadError::Write {
            path: target.clone(),
            source,
        })?;
    Ok(target)
}
