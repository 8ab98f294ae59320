//! services/studio/src/media.rs
//!
//! The upload and download boundaries: reading image files on disk into
//! `RoomImage`s, and saving generated images back out under their canonical
//! download names.

use design_consultant_core::domain::RoomImage;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Media types the upload boundary accepts, keyed by file extension.
fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Reads a single image file, declaring its media type from the extension.
/// Non-image files are rejected silently: `Ok(None)`, no upload occurs.
pub async fn load_room_image(path: &Path) -> std::io::Result<Option<RoomImage>> {
    let media_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(media_type_for_extension);
    let Some(media_type) = media_type else {
        debug!("Ignoring non-image upload: {}", path.display());
        return Ok(None);
    };
    let data = tokio::fs::read(path).await?;
    Ok(Some(RoomImage::new(data, media_type)))
}

/// Extracts the media type embedded in a data URI and maps it to a file
/// extension, defaulting to `png` when the URI is unparseable.
pub fn extension_for_data_uri(uri: &str) -> String {
    let pattern = Regex::new(r"data:([a-zA-Z0-9]+/[a-zA-Z0-9.+-]+).*,.*").unwrap();
    pattern
        .captures(uri)
        .and_then(|caps| caps.get(1))
        .and_then(|media| media.as_str().split('/').nth(1))
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| "png".to_string())
}

/// Writes a redesigned room into `dir` under the canonical download name,
/// returning the full path.
pub async fn save_room_image(image: &RoomImage, dir: &Path) -> std::io::Result<PathBuf> {
    let extension = extension_for_data_uri(&image.to_data_uri());
    let path = dir.join(format!("reimagined-room.{extension}"));
    tokio::fs::write(&path, &image.data).await?;
    Ok(path)
}

/// Writes an inspiration render into `dir`. The file name carries the first
/// 20 characters of the prompt (whitespace replaced) and is always `.jpeg`.
pub async fn save_inspiration_image(
    image: &RoomImage,
    dir: &Path,
    prompt: &str,
) -> std::io::Result<PathBuf> {
    let slug: String = prompt
        .chars()
        .take(20)
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    let path = dir.join(format!("inspiration-{slug}.jpeg"));
    tokio::fs::write(&path, &image.data).await?;
    Ok(path)
}
