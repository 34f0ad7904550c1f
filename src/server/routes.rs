//! HTTP routes
//!
//! Marshals requests into storage operations and their outcomes back into
//! responses. No filesystem access happens here.

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Router, middleware};
use futures_util::TryStreamExt;
use log::{info, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::io;
use std::sync::Arc;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::error::handlers::{handle_upload_error, upload_error_message, upload_error_to_status};
use crate::middleware::log_request;
use crate::server::render::{Notice, render_directory, render_not_found};
use crate::storage::{self, DownloadFile, DownloadOutcome, RootHandle, StoragePolicy, UploadOutcome};

/// Prefix of download URLs
const DOWNLOAD_PREFIX: &str = "download/";

/// Name of the multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

/// RFC 5987 attr-char set, everything else is percent-encoded
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Shared, read-only state handed to every request
#[derive(Debug, Clone)]
pub struct AppState {
    pub root: RootHandle,
    pub policy: StoragePolicy,
}

/// Builds the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(browse_root).post(upload_root))
        .route("/*path", get(get_path).post(upload_path))
        // The upload gate enforces its own size cap while streaming
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn browse_root(State(state): State<Arc<AppState>>) -> Response {
    browse_page(&state, "", StatusCode::OK, Vec::new()).await
}

async fn get_path(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    if let Some(file_path) = path.strip_prefix(DOWNLOAD_PREFIX) {
        match storage::download(&state.root, &state.policy, file_path).await {
            DownloadOutcome::Ready(download) => {
                info!("Download requested: {}", file_path);
                return attachment(download, state.policy.buffer_size);
            }
            DownloadOutcome::Failed => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not read file. Please try again.",
                )
                    .into_response();
            }
            // Falls through so a root directory named `download` stays browsable
            DownloadOutcome::NotFound => {}
        }
    }
    browse_page(&state, &path, StatusCode::OK, Vec::new()).await
}

async fn upload_root(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    upload_file(&state, "", multipart).await
}

async fn upload_path(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    multipart: Multipart,
) -> Response {
    upload_file(&state, &path, multipart).await
}

async fn browse_page(
    state: &AppState,
    path: &str,
    status: StatusCode,
    notices: Vec<Notice>,
) -> Response {
    match storage::browse(&state.root, &state.policy, path).await {
        Ok(result) => (status, render_directory(&result, &notices)).into_response(),
        Err(_) => not_found(),
    }
}

async fn upload_file(state: &AppState, path: &str, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload to /{}: {}", path, e);
                break;
            }
        };
        if field.name() == Some(FILE_FIELD) {
            return store_field(state, path, field).await;
        }
    }

    let notice = Notice::Error("No file part in the request.".into());
    browse_page(state, path, StatusCode::BAD_REQUEST, vec![notice]).await
}

async fn store_field(state: &AppState, path: &str, field: Field<'_>) -> Response {
    let filename = field.file_name().unwrap_or_default().to_string();
    if filename.is_empty() {
        let notice = Notice::Error("No file selected for uploading.".into());
        return browse_page(state, path, StatusCode::BAD_REQUEST, vec![notice]).await;
    }

    let reader = StreamReader::new(field.map_err(io::Error::other));
    tokio::pin!(reader);

    match storage::upload(&state.root, &state.policy, path, &filename, reader).await {
        UploadOutcome::Stored(stored) => {
            let notice = Notice::Info(format!(
                "File \"{}\" uploaded successfully to /{}",
                stored.name,
                path.trim_matches('/')
            ));
            browse_page(state, path, StatusCode::CREATED, vec![notice]).await
        }
        UploadOutcome::Rejected(e) => {
            handle_upload_error(&e, path);
            let notice = Notice::Error(upload_error_message(&e));
            browse_page(state, path, upload_error_to_status(&e), vec![notice]).await
        }
        UploadOutcome::NotFound => not_found(),
    }
}

fn attachment(download: DownloadFile, buffer_size: usize) -> Response {
    let stream = ReaderStream::with_capacity(download.file, buffer_size);
    let mut response = Response::new(Body::from_stream(stream));

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(download.len));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&download.name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    response
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
pub fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && !matches!(c, '"' | '\\' | '%') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(name, ATTR_CHAR)
    )
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, render_not_found()).into_response()
}
