use crate::AppState;
use crate::api::error::AppError;
use crate::api::response::ApiResponse;
use crate::models::FileEntry;
use crate::services::file_service::FileView;
use crate::utils::media_type::is_inline;
use axum::{
    body::Body,
    extract::{
        Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::{PathRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use tokio_util::io::{ReaderStream, StreamReader};
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Name to store the file under; sanitized to `[A-Za-z0-9_.-]`
    pub filename: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// Stored file name
    pub name: Option<String>,
}

fn multipart_error(e: &MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::InvalidInput(e.body_text())
    }
}

/// Body read failures surface from the store as I/O errors wrapping the multipart error.
fn classify_body_error(err: AppError) -> AppError {
    match err {
        AppError::Io(e) => {
            let mapped = e
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<MultipartError>())
                .map(multipart_error);
            mapped.unwrap_or(AppError::Io(e))
        }
        other => other,
    }
}

#[utoipa::path(
    get,
    path = "/api/list",
    responses(
        (status = 200, description = "Envelope whose data is every stored file", body = [FileEntry]),
        (status = 503, description = "Storage directory unreadable")
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<FileEntry>>, AppError> {
    let files = state.file_service.list_files().await?;
    Ok(ApiResponse::ok("Success", files))
}

#[utoipa::path(
    post,
    path = "/api/upload",
    params(UploadQuery),
    request_body(content = Multipart, description = "Multipart body with the payload in field `file`"),
    responses(
        (status = 200, description = "Envelope whose data is the stored (sanitized) name", body = String),
        (status = 400, description = "Missing filename or malformed body"),
        (status = 409, description = "A file with the same name already exists"),
        (status = 413, description = "Upload exceeds configured limit")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<String>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    // Name checks happen before the body is touched
    let filename = state
        .file_service
        .prepare_upload(query.filename.as_deref())
        .await?;

    let mut multipart = multipart.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let mut stored = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if stored || field.name() != Some("file") {
            continue;
        }

        let reader = StreamReader::new(field.map_err(std::io::Error::other));
        state
            .file_service
            .store_upload(&filename, reader)
            .await
            .map_err(classify_body_error)?;
        stored = true;
    }

    if !stored {
        return Err(AppError::InvalidInput("No file provided".to_string()));
    }

    Ok(ApiResponse::ok("File uploaded successfully", filename))
}

#[utoipa::path(
    delete,
    path = "/api/delete",
    params(DeleteQuery),
    responses(
        (status = 200, description = "File deleted"),
        (status = 400, description = "Missing or invalid name"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    state
        .file_service
        .delete_file(query.name.as_deref())
        .await?;
    Ok(ApiResponse::message("File deleted successfully"))
}

fn content_disposition(name: &str, content_type: &str) -> String {
    if is_inline(content_type) {
        return "inline".to_string();
    }

    let ascii_filename = name
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };

    // RFC 5987 percent-encoding for UTF-8 filename
    let encoded_filename = utf8_percent_encode(name, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

fn stream_response(view: FileView) -> Response {
    let status = if view.range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };
    let content_length = view.content_length();
    let disposition = content_disposition(&view.name, &view.content_type);

    let body = Body::from_stream(ReaderStream::new(view.reader));
    let mut response = (
        status,
        [
            (header::CONTENT_TYPE, header_value(&view.content_type)),
            (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
        ],
        body,
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));

    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    if let Some(range) = view.range {
        if let Ok(value) = HeaderValue::from_str(&range.content_range(view.total_size)) {
            headers.insert(header::CONTENT_RANGE, value);
        }
    }

    if let Some(modified) = view.last_modified {
        let dt: chrono::DateTime<chrono::Utc> = modified.into();
        let rfc1123 = dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        if let Ok(value) = rfc1123.parse() {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }

    response
}

#[utoipa::path(
    get,
    path = "/api/view/{fileName}",
    params(
        ("fileName" = String, Path, description = "Stored file name"),
        ("Range" = Option<String>, Header, description = "Single byte range, e.g. `bytes=0-1023`")
    ),
    responses(
        (status = 200, description = "Whole file stream"),
        (status = 206, description = "Requested byte span"),
        (status = 404, description = "File not found"),
        (status = 416, description = "Range not satisfiable")
    ),
    tag = "files"
)]
pub async fn view_file(
    State(state): State<AppState>,
    file_name: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Path(file_name) = file_name.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    // A non-UTF-8 value parses as malformed rather than being ignored
    let range_header = headers
        .get(header::RANGE)
        .map(|v| v.to_str().unwrap_or_default());

    let view = state
        .file_service
        .open_view(&file_name, range_header)
        .await?;

    Ok(stream_response(view))
}
