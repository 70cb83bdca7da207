use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use provider::ProviderError;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    Provider(ProviderError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::Provider(err) => {
                tracing::error!("Provider error: {:?}", err);
                match err {
                    ProviderError::NotFound(id) => (
                        StatusCode::NOT_FOUND,
                        "not_found",
                        format!("Instance not found: {}", id),
                    ),
                    ProviderError::Rejected { .. } => {
                        (StatusCode::CONFLICT, "provider_rejected", err.to_string())
                    }
                    ProviderError::Unreachable(_) => (
                        StatusCode::BAD_GATEWAY,
                        "provider_unreachable",
                        err.to_string(),
                    ),
                }
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err)
    }
}
