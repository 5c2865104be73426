mod flashcard;

use axum::{Json, response::IntoResponse};
use serde_json::json;
use tracing::warn;

use crate::{auth::UserId, errors::ApiError};

pub use flashcard::*;

pub(crate) fn check_user_id(user_id: Option<UserId>) -> Result<UserId, ApiError> {
    let user_id = user_id.ok_or(ApiError::UserNotFoundOrUnauthorized)?;
    if user_id.as_str().is_empty() {
        warn!("User ID is empty, returning unauthorized error");
        return Err(ApiError::UserNotFoundOrUnauthorized);
    }
    Ok(user_id)
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
