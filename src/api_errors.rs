use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::errors::BeerError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status();
        (code, Json(ErrBody { error: self.to_string() })).into_response()
    }
}

impl From<BeerError> for AppError {
    fn from(err: BeerError) -> Self {
        match err {
            BeerError::Schema { .. } | BeerError::Validation { .. } => {
                AppError::Unprocessable(err.to_string())
            }
            BeerError::Serialization { context, source } => {
                AppError::BadRequest(format!("Serialization {context} failed: {source}"))
            }
            BeerError::Decode { .. } | BeerError::Tensor(_) => AppError::Internal(err.to_string()),
            BeerError::Config { .. }
            | BeerError::Artifact { .. }
            | BeerError::Io { .. }
            | BeerError::Dataset { .. }
            | BeerError::Internal { .. } => AppError::Internal(err.to_string()),
        }
    }
}
