//! Streaming file downloads and uploads.

use std::io::ErrorKind;
use std::path::Path;
use std::pin::pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::error::ServeError;
use crate::resolve::{ResolvedPath, resolve_new_entry};
use crate::root::ServerRoot;

/// An opened file ready to be streamed to a client
#[derive(Debug)]
pub struct FileDownload {
    file: fs::File,
    pub size: u64,
    pub content_type: String,
    pub file_name: String,
}

impl FileDownload {
    pub fn into_stream(self) -> ReaderStream<fs::File> {
        ReaderStream::new(self.file)
    }
}

/// Result of a stored upload
#[derive(Debug)]
pub struct StoredUpload {
    pub path: ResolvedPath,
    pub size: u64,
}

/// Content type for a file, keyed by extension.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Open a resolved file for streaming.
pub async fn open_file(path: &ResolvedPath) -> Result<FileDownload, ServeError> {
    let missing = |err: std::io::Error| match err.kind() {
        ErrorKind::NotFound => ServeError::NotFound(path.relative().to_string()),
        _ => ServeError::Io(err),
    };

    let metadata = fs::metadata(path.as_path()).await.map_err(missing)?;
    if metadata.is_dir() {
        return Err(ServeError::NotAFile);
    }

    let file = fs::File::open(path.as_path()).await.map_err(missing)?;
    debug!("Streaming file: {}", path.as_path().display());

    Ok(FileDownload {
        file,
        size: metadata.len(),
        content_type: content_type_for(path.as_path()),
        file_name: path.file_name(),
    })
}

/// Reduce a client supplied filename to its final path segment.
///
/// Both `/` and `\` count as separators since browsers on either family of
/// hosts may send full paths.
pub fn upload_name(raw: &str) -> Result<&str, ServeError> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        warn!("Rejected upload filename: {:?}", raw);
        return Err(ServeError::BadUpload(format!("Invalid filename: {:?}", raw)));
    }

    Ok(name)
}

/// Store `content` as `root/<basename of raw_filename>`, replacing any file
/// of the same name.
///
/// Stops and removes the partial file once more than `limit` bytes arrive.
pub async fn write_upload<S, E>(
    root: &ServerRoot,
    raw_filename: &str,
    content: S,
    limit: u64,
) -> Result<StoredUpload, ServeError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let name = upload_name(raw_filename)?;
    let target = resolve_new_entry(root, name)?;

    let is_dir = fs::metadata(target.as_path())
        .await
        .is_ok_and(|metadata| metadata.is_dir());
    if is_dir {
        return Err(ServeError::NotAFile);
    }

    let mut file = fs::File::create(target.as_path()).await?;
    let mut content = pin!(content);
    let mut written: u64 = 0;

    while let Some(chunk) = content.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                discard_partial(&target).await;
                return Err(ServeError::BadUpload(format!("Upload interrupted: {}", err)));
            }
        };

        written += chunk.len() as u64;
        if written > limit {
            warn!("Upload {:?} exceeded {} bytes", name, limit);
            discard_partial(&target).await;
            return Err(ServeError::UploadTooLarge { limit });
        }

        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    info!(
        "Stored upload: {} ({} bytes)",
        target.as_path().display(),
        written
    );

    Ok(StoredUpload {
        path: target,
        size: written,
    })
}

async fn discard_partial(target: &ResolvedPath) {
    if let Err(err) = fs::remove_file(target.as_path()).await {
        warn!(
            "Failed to remove partial upload {}: {}",
            target.as_path().display(),
            err
        );
    }
}
