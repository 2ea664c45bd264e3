use crate::error::AppError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, object: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            object: Some(object),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>, errors: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            object: None,
            errors,
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientStock { .. } => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Csv(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotFound(_) => "product not found",
            AppError::InsufficientStock { .. } => "insufficient stock",
            AppError::Persistence(_) | AppError::Csv(_) | AppError::Io(_) => "internal error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ApiResponse::failure(self.public_message(), Some(self.to_string()));
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductId;

    #[test]
    fn test_each_failure_has_its_own_status() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("who".into()), StatusCode::UNAUTHORIZED),
            (AppError::NotFound(ProductId::new()), StatusCode::NOT_FOUND),
            (
                AppError::InsufficientStock {
                    product: "Lamp".into(),
                    requested: 2,
                    available: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                AppError::persistence("disk on fire"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_envelope_omits_empty_fields() {
        let json = serde_json::to_value(ApiResponse::failure("nope", None)).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": "nope"}));
    }
}
