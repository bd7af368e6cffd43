//! Public handlers: browsing, downloading and uploading.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use mime_guess::mime;
use protocol::{FolderListing, RootItem, UploadResponse};
use serde::Deserialize;
use tokio_util::io::{ReaderStream, SyncIoBridge};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{info, warn};

use super::{run_blocking, ApiError, AppState};
use crate::files::{archive, ResolvedFile, SharedEntry, UploadError};

/// Bytes of finished archive data buffered between the zip writer and the client.
const ZIP_PIPE_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub(super) struct PathQuery {
    #[serde(default)]
    path: String,
}

pub(super) async fn list_root(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RootItem>>, ApiError> {
    let entries = state.registry.list_root_sorted()?;
    Ok(Json(entries.iter().map(SharedEntry::to_protocol).collect()))
}

pub(super) async fn list_folder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PathQuery>,
) -> Result<Json<FolderListing>, ApiError> {
    run_blocking(move || {
        state
            .browser
            .list(&id, &query.path)
            .map(|listing| Json(listing.to_protocol()))
            .map_err(|e| ApiError::for_share(e, &id, &query.path))
    })
    .await
}

pub(super) async fn download_shared_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let file = run_blocking(move || Ok(state.resolver.resolve_file(&id)?)).await?;
    serve_file(file, request).await
}

pub(super) async fn download_folder_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PathQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    let file = run_blocking(move || {
        state
            .resolver
            .resolve_folder_file(&id, &query.path)
            .map_err(|e| ApiError::for_share(e, &id, &query.path))
    })
    .await?;
    serve_file(file, request).await
}

pub(super) async fn download_folder_zip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let share = id.clone();
    let dir = run_blocking(move || {
        state
            .resolver
            .resolve_directory(&id, &query.path)
            .map_err(|e| ApiError::for_share(e, &id, &query.path))
    })
    .await?;

    let disposition = content_disposition(&format!("{}.zip", dir.name));
    let (writer, reader) = tokio::io::duplex(ZIP_PIPE_CAPACITY);
    let writer = SyncIoBridge::new(writer);

    // The archive is produced while the body is sent. A failure past this
    // point can only cut the stream short.
    tokio::task::spawn_blocking(move || {
        match archive::stream_zip(&dir.absolute_path, &dir.name, dir.include_hidden, writer) {
            Ok((_, summary)) => info!(
                share = %share,
                files = summary.files,
                directories = summary.directories,
                skipped = summary.skipped,
                "Streamed archive of {:?}",
                dir.name
            ),
            Err(e) => warn!(share = %share, error = %e, "Archive stream aborted"),
        }
    });

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response())
}

pub(super) async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    if !state.uploads.is_enabled() {
        return Err(UploadError::Disabled.into());
    }
    let mut multipart =
        multipart.map_err(|_| ApiError::bad_request("Expected a multipart/form-data body"))?;

    let mut stored = Vec::new();
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("files") {
            continue;
        }
        let client_name = field.file_name().unwrap_or_default().to_string();
        let uploads = state.uploads.clone();
        let mut pending = run_blocking(move || Ok(uploads.begin(&client_name)?)).await?;
        while let Some(chunk) = field.chunk().await? {
            pending = run_blocking(move || {
                pending.write_chunk(&chunk)?;
                Ok(pending)
            })
            .await?;
        }
        let name = run_blocking(move || Ok(pending.finish()?)).await?;
        stored.push(name);
    }

    if stored.is_empty() {
        return Err(ApiError::bad_request("No files in upload"));
    }
    Ok(Json(UploadResponse {
        success: true,
        files: stored,
    }))
}

/// Stream a resolved file. Range and conditional requests are honored.
async fn serve_file(file: ResolvedFile, request: Request) -> Result<Response, ApiError> {
    let mime_type = file
        .mime_type
        .parse::<mime::Mime>()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);

    let response = ServeFile::new_with_mime(&file.absolute_path, &mime_type)
        .oneshot(request)
        .await
        .unwrap_or_else(|never: Infallible| match never {});

    let mut response = response.map(Body::new);
    if response.status().is_success() {
        response.headers_mut().insert(
            header::CONTENT_DISPOSITION,
            content_disposition(&file.file_name),
        );
    }
    Ok(response)
}

/// `attachment` disposition with an ASCII fallback and the exact UTF-8 name.
fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        let value = content_disposition("report.pdf");
        assert_eq!(
            value.to_str().unwrap(),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
    }

    #[test]
    fn test_content_disposition_escapes() {
        let value = content_disposition("my \"best\" café.txt");
        let text = value.to_str().unwrap();
        assert!(text.contains("filename=\"my _best_ caf_.txt\""));
        assert!(text.contains("filename*=UTF-8''my%20%22best%22%20caf%C3%A9.txt"));
    }
}
