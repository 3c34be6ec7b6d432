use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Uniform JSON wrapper for every non-streaming response.
///
/// `statusCode` always mirrors the HTTP status the envelope is sent with.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_message: String,
    pub status_code: u16,
    pub data: Option<T>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, Some(data))
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status_message: message.into(),
            status_code: status.as_u16(),
            data,
            status,
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope carrying `data: null`.
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
