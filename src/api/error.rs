use crate::api::response::ApiResponse;
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Range not satisfiable for resource of {size} bytes")]
    RangeNotSatisfiable { size: u64 },

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::InvalidInput(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Unavailable(msg) => msg.clone(),
            AppError::RangeNotSatisfiable { .. } => "Requested range not satisfiable".to_string(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {:?}", e);
                "Internal Server Error".to_string()
            }
        };

        let mut response = ApiResponse::<()>::with_status(status, message, None).into_response();

        if let AppError::RangeNotSatisfiable { size } = self {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", size)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }

        response
    }
}
