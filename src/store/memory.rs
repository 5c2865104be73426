//! In-process flashcard store, used when no database is configured.
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::{FlashcardStore, StoreError, StoreResult};
use crate::models::{Flashcard, FlashcardNew};

#[derive(Default)]
pub struct MemoryFlashcardStore {
    cards: DashMap<Uuid, Flashcard>,
}

impl MemoryFlashcardStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(user_id: &str, card: FlashcardNew, today: NaiveDate) -> Flashcard {
        let now = Utc::now();
        let difficulty = card.initial_difficulty();
        Flashcard {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            subject_id: card.subject_id,
            question: card.question,
            answer: card.answer,
            difficulty,
            next_review_date: today,
            review_count: 0,
            correct_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn owned_by(&self, user_id: &str) -> Vec<Flashcard> {
        self.cards
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn write(&self, card: &Flashcard, expected_review_count: Option<i32>) -> StoreResult<Flashcard> {
        let mut stored = self
            .cards
            .get_mut(&card.id)
            .filter(|stored| stored.user_id == card.user_id)
            .ok_or(StoreError::NotFound)?;
        if let Some(expected) = expected_review_count {
            if stored.review_count != expected {
                return Err(StoreError::Conflict);
            }
        }
        stored.difficulty = card.difficulty;
        stored.next_review_date = card.next_review_date;
        stored.review_count = card.review_count;
        stored.correct_count = card.correct_count;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

impl FlashcardStore for MemoryFlashcardStore {
    async fn load_flashcard(&self, id: Uuid, user_id: &str) -> StoreResult<Option<Flashcard>> {
        Ok(self
            .cards
            .get(&id)
            .filter(|card| card.user_id == user_id)
            .map(|card| card.value().clone()))
    }

    async fn save_flashcard(&self, card: &Flashcard) -> StoreResult<Flashcard> {
        self.write(card, None)
    }

    async fn save_reviewed_flashcard(
        &self,
        card: &Flashcard,
        expected_review_count: i32,
    ) -> StoreResult<Flashcard> {
        self.write(card, Some(expected_review_count))
    }

    async fn create_flashcard(
        &self,
        user_id: &str,
        card: FlashcardNew,
        today: NaiveDate,
    ) -> StoreResult<Flashcard> {
        let card = Self::build(user_id, card, today);
        self.cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn create_flashcards(
        &self,
        user_id: &str,
        cards: Vec<FlashcardNew>,
        today: NaiveDate,
    ) -> StoreResult<Vec<Flashcard>> {
        let created: Vec<Flashcard> = cards
            .into_iter()
            .map(|card| Self::build(user_id, card, today))
            .collect();
        for card in &created {
            self.cards.insert(card.id, card.clone());
        }
        Ok(created)
    }

    async fn delete_flashcard(&self, id: Uuid, user_id: &str) -> StoreResult<()> {
        self.cards
            .remove_if(&id, |_, card| card.user_id == user_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_flashcards(&self, user_id: &str) -> StoreResult<Vec<Flashcard>> {
        let mut cards = self.owned_by(user_id);
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(cards)
    }

    async fn list_due_flashcards(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> StoreResult<Vec<Flashcard>> {
        let mut cards: Vec<Flashcard> = self
            .owned_by(user_id)
            .into_iter()
            .filter(|card| card.is_due(today))
            .collect();
        cards.sort_by(|a, b| {
            a.next_review_date
                .cmp(&b.next_review_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(cards)
    }
}
