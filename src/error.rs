//! Error handling

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::engine::EngineError;
use crate::models::ErrorBody;

pub type AppResult<T> = Result<T, AppError>;

/// Failures surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller sent unusable input.
    #[error("{0}")]
    Validation(String),

    /// Request body did not parse as the expected shape.
    #[error("{0}")]
    Payload(String),

    /// The inference engine failed.
    #[error("{0}")]
    Inference(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Payload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail: self.to_string(),
        })
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Inference(err.to_string())
    }
}
