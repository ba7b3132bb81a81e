pub mod codes;
pub mod envelope;
pub mod handlers;

pub use codes::ErrorCode;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Uniform error body returned for every failed request.
///
/// # JSON Example
///
/// ```json
/// {
///   "success": false,
///   "error": "Route /api/nope not found"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable message; generic for server errors
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Internal description of a failure, attached to the response as an extension.
///
/// The client only sees the generic body; the reporting middleware reads the
/// detail from here.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SerdeJson(_) | AppError::Io(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::SerdeJson(_) => ErrorCode::SerdeJsonError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::BadRequest(_) => ErrorCode::ValidationError,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::PayloadTooLarge(_) => ErrorCode::PayloadTooLarge,
            AppError::InternalServerError(_) => ErrorCode::InternalError,
            AppError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let detail = self.to_string();

        let message = match self {
            AppError::SerdeJson(_) | AppError::Io(_) | AppError::InternalServerError(_) => {
                tracing::error!(error_code = code.code(), "{}", detail);
                code.default_message().to_string()
            }
            AppError::ServiceUnavailable(_) => {
                tracing::warn!(error_code = code.code(), "{}", detail);
                code.default_message().to_string()
            }
            AppError::BadRequest(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg) => {
                tracing::info!(error_code = code.code(), "{}", detail);
                msg
            }
        };

        let mut response = error_response(status, message);
        response
            .extensions_mut()
            .insert(ErrorDetail { code, message: detail });
        response
    }
}

/// Helper function to create error responses.
///
/// Server errors always carry the generic message, whatever the caller passes.
///
/// # Example
///
/// ```rust,ignore
/// use axum_helpers::errors::error_response;
/// use axum::http::StatusCode;
///
/// let response = error_response(StatusCode::FORBIDDEN, "Not allowed by CORS");
/// ```
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let message = if status.is_server_error() {
        ErrorCode::from_status(status).default_message().to_string()
    } else {
        message.into()
    };

    (status, Json(ErrorResponse::new(message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_client_error_keeps_message() {
        let response = AppError::NotFound("Post not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"success": false, "error": "Post not found"})
        );
    }

    #[tokio::test]
    async fn test_server_error_is_generic() {
        let response =
            AppError::InternalServerError("pool exhausted on shard 3".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let detail = response.extensions().get::<ErrorDetail>().cloned().unwrap();
        assert_eq!(detail.code, ErrorCode::InternalError);
        assert!(detail.message.contains("pool exhausted"));

        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_io_error_maps_to_500() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "uploads missing");
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_error_response_hides_5xx_message() {
        let response = error_response(StatusCode::BAD_GATEWAY, "upstream said: secret");
        assert_eq!(body_json(response).await["error"], "Internal Server Error");
    }
}
