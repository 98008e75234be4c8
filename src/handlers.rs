use axum::{
    Json,
    body::Body,
    extract::{Multipart, Query, State, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::error::ServeError;
use crate::listing::list_directory;
use crate::pages;
use crate::resolve::{ResolvedPath, resolve};
use crate::transfer::{open_file, write_upload};

/// Query parameters for the change-root endpoint
#[derive(Debug, Deserialize)]
pub struct ChangeDirQuery {
    /// New root; absolute, or relative to the current root
    #[serde(default)]
    pub new_dir: String,
}

/// GET / - Home page with upload and change-root forms
pub async fn home(State(state): State<AppState>) -> Html<String> {
    Html(pages::home_page(&state.root.get()))
}

/// GET /browse, /browse/{*path} - Directory listing or raw file
pub async fn browse(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ServeError> {
    let root = state.root.get();

    // Raw path so percent-decoding happens exactly once, in the resolver.
    let raw = uri.path().strip_prefix("/browse").unwrap_or_default();
    let resolved = resolve(&root, raw)?;

    let metadata = tokio::fs::metadata(resolved.as_path())
        .await
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => ServeError::NotFound(resolved.relative().to_string()),
            _ => ServeError::Io(err),
        })?;
    if !metadata.is_dir() {
        return serve_file(&resolved).await;
    }

    debug!("Listing directory: {}", resolved.as_path().display());
    let config = state.config.clone();
    let dir = resolved;
    let listing = tokio::task::spawn_blocking(move || list_directory(&root, &dir, &config))
        .await
        .map_err(|err| ServeError::Io(std::io::Error::other(err.to_string())))??;

    if wants_json(&headers) {
        Ok(Json(listing).into_response())
    } else {
        Ok(Html(pages::listing_page(&listing)).into_response())
    }
}

/// Stream a file with an inferred content type.
async fn serve_file(path: &ResolvedPath) -> Result<Response, ServeError> {
    let download = open_file(path).await?;

    let safe_filename: String = download
        .file_name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' { '\'' } else { c })
        .collect();

    let headers = [
        (header::CONTENT_TYPE, download.content_type.clone()),
        (header::CONTENT_LENGTH, download.size.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", safe_filename),
        ),
    ];
    let body = Body::from_stream(download.into_stream());

    Ok((StatusCode::OK, headers, body).into_response())
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

/// GET /change_dir?new_dir=... - Switch the server root
pub async fn change_dir(
    State(state): State<AppState>,
    Query(query): Query<ChangeDirQuery>,
) -> Result<Redirect, ServeError> {
    let root = state.root.set(&query.new_dir)?;
    info!("Now serving: {}", root);
    Ok(Redirect::to("/"))
}

/// POST /upload - Store the multipart `file` field under the current root
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, ServeError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!("Upload rejected: {}", rejection);
        ServeError::BadUpload("Invalid Content-Type for upload.".to_string())
    })?;

    let root = state.root.get();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        warn!("Multipart error: {}", err);
        ServeError::BadUpload(err.to_string())
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let Some(raw_filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if raw_filename.is_empty() {
            break;
        }

        let stored = write_upload(&root, &raw_filename, field, state.config.max_upload_size).await?;
        return Ok(Html(pages::upload_page(&stored.path.file_name())));
    }

    Err(ServeError::BadUpload(
        "No file provided or upload failed.".to_string(),
    ))
}

/// Any other path or method
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not found.",
    )
}
