//! Error handling for the API
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::srs::ReviewError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    SQLError(sqlx::Error),
    ReviewError(ReviewError),
    InvalidInput(String),
    FlashcardNotFound,
    ReviewConflict,
    UserNotFoundOrUnauthorized,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::SQLError(_) | Self::ReviewError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::FlashcardNotFound => StatusCode::NOT_FOUND,
            Self::ReviewConflict => StatusCode::CONFLICT,
            Self::UserNotFoundOrUnauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::SQLError(e) => format!("SQL error: {e}"),
            Self::ReviewError(e) => format!("Corrupt flashcard: {e}"),
            Self::InvalidInput(msg) => msg.clone(),
            Self::FlashcardNotFound => "Flashcard not found".to_string(),
            Self::ReviewConflict => "Flashcard was reviewed concurrently, reload it".to_string(),
            Self::UserNotFoundOrUnauthorized => "User not found or unauthorized".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!("Request failed: {}", message);
        }
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::SQLError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::InvalidInput(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::InvalidInput(e.body_text())
    }
}

impl From<ReviewError> for ApiError {
    fn from(e: ReviewError) -> Self {
        Self::ReviewError(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::FlashcardNotFound,
            StoreError::Conflict => Self::ReviewConflict,
            StoreError::Database(e) => Self::SQLError(e),
        }
    }
}
