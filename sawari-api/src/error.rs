use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use sawari_core::DomainError;

#[derive(Debug)]
pub enum AppError {
    Domain(DomainError),
    Internal(anyhow::Error),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Domain(DomainError::Internal(msg)) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Domain(err) => {
                let status = match &err {
                    DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                    DomainError::Validation(_) | DomainError::InvalidState(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    DomainError::Expired(_) => StatusCode::GONE,
                    DomainError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
                    DomainError::Conflict(_) => StatusCode::CONFLICT,
                    DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
