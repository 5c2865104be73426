use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    models::{FlashcardImport, FlashcardNew, FlashcardStats, ReviewSubmission},
    router::AppState,
    routes::check_user_id,
    srs::{MAX_DIFFICULTY, MIN_DIFFICULTY, record_review},
    store::FlashcardStore,
};

fn validate_new_card(card: FlashcardNew) -> Result<FlashcardNew, ApiError> {
    let question = card.question.trim();
    let answer = card.answer.trim();
    if question.is_empty() || answer.is_empty() {
        return Err(ApiError::InvalidInput(
            "Question and answer must not be empty".to_string(),
        ));
    }
    if let Some(difficulty) = card.difficulty {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
            return Err(ApiError::InvalidInput(format!(
                "Difficulty must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}"
            )));
        }
    }
    Ok(FlashcardNew {
        question: question.to_string(),
        answer: answer.to_string(),
        ..card
    })
}

pub async fn list_flashcards<S: FlashcardStore>(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = check_user_id(user_id)?;
    let cards = state.store.list_flashcards(user_id.as_str()).await?;
    Ok(Json(cards))
}

pub async fn due_flashcards<S: FlashcardStore>(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = check_user_id(user_id)?;
    let cards = state
        .store
        .list_due_flashcards(user_id.as_str(), state.clock.today())
        .await?;
    Ok(Json(cards))
}

pub async fn flashcard_stats<S: FlashcardStore>(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = check_user_id(user_id)?;
    let cards = state.store.list_flashcards(user_id.as_str()).await?;
    Ok(Json(FlashcardStats::collect(&cards, state.clock.today())))
}

pub async fn get_flashcard<S: FlashcardStore>(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<Arc<AppState<S>>>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = check_user_id(user_id)?;
    let card = state
        .store
        .load_flashcard(id, user_id.as_str())
        .await?
        .ok_or(ApiError::FlashcardNotFound)?;
    Ok(Json(card))
}

pub async fn create_flashcard<S: FlashcardStore>(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<Arc<AppState<S>>>,
    WithRejection(Json(form), _): WithRejection<Json<FlashcardNew>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = check_user_id(user_id)?;
    let form = validate_new_card(form)?;
    let card = state
        .store
        .create_flashcard(user_id.as_str(), form, state.clock.today())
        .await?;
    info!("Flashcard {} created for user {}", card.id, user_id);
    Ok(Json(card))
}

// Bulk import of cards suggested by the AI helper
pub async fn import_flashcards<S: FlashcardStore>(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<Arc<AppState<S>>>,
    WithRejection(Json(import), _): WithRejection<Json<FlashcardImport>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = check_user_id(user_id)?;
    if import.flashcards.is_empty() {
        warn!("Empty flashcard import from user {}", user_id);
        return Err(ApiError::InvalidInput("No flashcards to import".to_string()));
    }
    let cards = import
        .into_new_cards()
        .into_iter()
        .map(validate_new_card)
        .collect::<Result<Vec<_>, _>>()?;
    let created = state
        .store
        .create_flashcards(user_id.as_str(), cards, state.clock.today())
        .await?;
    info!("Imported {} flashcards for user {}", created.len(), user_id);
    Ok(Json(created))
}

pub async fn delete_flashcard<S: FlashcardStore>(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<Arc<AppState<S>>>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = check_user_id(user_id)?;
    state.store.delete_flashcard(id, user_id.as_str()).await?;
    info!("Flashcard {} deleted by user {}", id, user_id);
    Ok(Json(json!({ "success": true })))
}

pub async fn review_flashcard<S: FlashcardStore>(
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    State(state): State<Arc<AppState<S>>>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(submission), _): WithRejection<Json<ReviewSubmission>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = check_user_id(user_id)?;
    let card = record_review(
        &state.store,
        state.clock.as_ref(),
        id,
        user_id.as_str(),
        submission.correct,
    )
    .await?;
    Ok(Json(card))
}
