//! Persistence contract for flashcards, scoped by owning user.
pub(crate) mod memory;
pub(crate) mod postgres;

use std::future::Future;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Flashcard, FlashcardNew};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("flashcard not found")]
    NotFound,
    #[error("flashcard was modified concurrently")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait FlashcardStore: Send + Sync + 'static {
    /// Returns `None` when the card does not exist or belongs to someone else.
    fn load_flashcard(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> impl Future<Output = StoreResult<Option<Flashcard>>> + Send;

    /// Overwrites the scheduling state of an existing card, last write wins.
    ///
    /// For callers outside the review flow; reviews go through
    /// [`FlashcardStore::save_reviewed_flashcard`].
    fn save_flashcard(&self, card: &Flashcard)
    -> impl Future<Output = StoreResult<Flashcard>> + Send;

    /// Like [`FlashcardStore::save_flashcard`], but fails with
    /// [`StoreError::Conflict`] unless the stored review count is still
    /// `expected_review_count`.
    fn save_reviewed_flashcard(
        &self,
        card: &Flashcard,
        expected_review_count: i32,
    ) -> impl Future<Output = StoreResult<Flashcard>> + Send;

    fn create_flashcard(
        &self,
        user_id: &str,
        card: FlashcardNew,
        today: NaiveDate,
    ) -> impl Future<Output = StoreResult<Flashcard>> + Send;

    /// Inserts every card or none of them.
    fn create_flashcards(
        &self,
        user_id: &str,
        cards: Vec<FlashcardNew>,
        today: NaiveDate,
    ) -> impl Future<Output = StoreResult<Vec<Flashcard>>> + Send;

    fn delete_flashcard(&self, id: Uuid, user_id: &str)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// Newest first.
    fn list_flashcards(&self, user_id: &str)
    -> impl Future<Output = StoreResult<Vec<Flashcard>>> + Send;

    /// Cards due on `today`, oldest review date first.
    fn list_due_flashcards(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> impl Future<Output = StoreResult<Vec<Flashcard>>> + Send;
}
