//! Image upload storage.
//!
//! Uploaded files are written verbatim into one flat directory under their
//! client-supplied file name and served back from `/images/<name>`. A second
//! upload with the same name replaces the first. Contents are not inspected.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

/// URL prefix uploaded files are served under.
pub const IMAGES_ROUTE: &str = "/images";

/// Response body for a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    #[serde(rename = "imageURL")]
    pub image_url: String,
}

/// Reduce a client file name to a single path component.
///
/// Directory parts are dropped so the file always lands inside the upload
/// directory. Returns `None` when nothing usable is left.
pub fn stored_file_name(client_name: &str) -> Option<String> {
    // Browsers on Windows may send backslash-separated paths
    let last = client_name.rsplit(&['/', '\\'][..]).next()?;
    match Path::new(last).file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.is_empty() => Some(name.to_string()),
        _ => None,
    }
}

/// Write `bytes` to `<dir>/<file_name>`, creating `dir` if needed.
///
/// `file_name` must already be a single path component (see
/// [`stored_file_name`]).
pub async fn save_image(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<UploadedImage> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create upload directory: {}", dir.display()))?;

    let path: PathBuf = dir.join(file_name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write upload: {}", path.display()))?;

    tracing::info!(path = %path.display(), size = bytes.len(), "image uploaded");

    Ok(UploadedImage {
        image_url: format!("{}/{}", IMAGES_ROUTE, file_name),
    })
}

/// Run an upload write, failing if it does not finish within `limit`.
pub async fn save_within<F>(limit: Duration, save: F) -> Result<UploadedImage>
where
    F: Future<Output = Result<UploadedImage>>,
{
    tokio::time::timeout(limit, save)
        .await
        .map_err(|_| anyhow::anyhow!("upload timed out after {:?}", limit))?
}
