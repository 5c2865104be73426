use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{FlashcardStore, StoreError, StoreResult};
use crate::models::{Flashcard, FlashcardNew};

pub struct PgFlashcardStore {
    db: Arc<PgPool>,
}

impl PgFlashcardStore {
    pub fn new(db: PgPool) -> Self {
        Self { db: Arc::new(db) }
    }
}

const INSERT_FLASHCARD: &str = r#"
    INSERT INTO flashcards (user_id, subject_id, question, answer, difficulty, next_review_date)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING *
"#;

impl FlashcardStore for PgFlashcardStore {
    async fn load_flashcard(&self, id: Uuid, user_id: &str) -> StoreResult<Option<Flashcard>> {
        let card = sqlx::query_as::<_, Flashcard>(
            "SELECT * FROM flashcards WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(card)
    }

    async fn save_flashcard(&self, card: &Flashcard) -> StoreResult<Flashcard> {
        let saved = sqlx::query_as::<_, Flashcard>(
            r#"
            UPDATE flashcards
            SET difficulty = $1,
                next_review_date = $2,
                review_count = $3,
                correct_count = $4,
                updated_at = NOW()
            WHERE id = $5 AND user_id = $6
            RETURNING *
            "#,
        )
        .bind(card.difficulty)
        .bind(card.next_review_date)
        .bind(card.review_count)
        .bind(card.correct_count)
        .bind(card.id)
        .bind(&card.user_id)
        .fetch_optional(&*self.db)
        .await?;
        saved.ok_or(StoreError::NotFound)
    }

    async fn save_reviewed_flashcard(
        &self,
        card: &Flashcard,
        expected_review_count: i32,
    ) -> StoreResult<Flashcard> {
        let saved = sqlx::query_as::<_, Flashcard>(
            r#"
            UPDATE flashcards
            SET difficulty = $1,
                next_review_date = $2,
                review_count = $3,
                correct_count = $4,
                updated_at = NOW()
            WHERE id = $5 AND user_id = $6 AND review_count = $7
            RETURNING *
            "#,
        )
        .bind(card.difficulty)
        .bind(card.next_review_date)
        .bind(card.review_count)
        .bind(card.correct_count)
        .bind(card.id)
        .bind(&card.user_id)
        .bind(expected_review_count)
        .fetch_optional(&*self.db)
        .await?;

        match saved {
            Some(card) => Ok(card),
            // Tell a vanished card apart from one someone else just reviewed.
            None => match self.load_flashcard(card.id, &card.user_id).await? {
                Some(_) => Err(StoreError::Conflict),
                None => Err(StoreError::NotFound),
            },
        }
    }

    async fn create_flashcard(
        &self,
        user_id: &str,
        card: FlashcardNew,
        today: NaiveDate,
    ) -> StoreResult<Flashcard> {
        let difficulty = card.initial_difficulty();
        let card = sqlx::query_as::<_, Flashcard>(INSERT_FLASHCARD)
            .bind(user_id)
            .bind(card.subject_id)
            .bind(card.question)
            .bind(card.answer)
            .bind(difficulty)
            .bind(today)
            .fetch_one(&*self.db)
            .await?;
        Ok(card)
    }

    async fn create_flashcards(
        &self,
        user_id: &str,
        cards: Vec<FlashcardNew>,
        today: NaiveDate,
    ) -> StoreResult<Vec<Flashcard>> {
        let mut created = Vec::with_capacity(cards.len());
        let mut tx = self.db.begin().await?;
        for card in cards {
            let difficulty = card.initial_difficulty();
            let card = sqlx::query_as::<_, Flashcard>(INSERT_FLASHCARD)
                .bind(user_id)
                .bind(card.subject_id)
                .bind(card.question)
                .bind(card.answer)
                .bind(difficulty)
                .bind(today)
                .fetch_one(&mut *tx)
                .await?;
            created.push(card);
        }
        tx.commit().await?;
        debug!("Imported {} flashcards for user {}", created.len(), user_id);
        Ok(created)
    }

    async fn delete_flashcard(&self, id: Uuid, user_id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_flashcards(&self, user_id: &str) -> StoreResult<Vec<Flashcard>> {
        let cards = sqlx::query_as::<_, Flashcard>(
            "SELECT * FROM flashcards WHERE user_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(cards)
    }

    async fn list_due_flashcards(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> StoreResult<Vec<Flashcard>> {
        let cards = sqlx::query_as::<_, Flashcard>(
            r#"
            SELECT * FROM flashcards
            WHERE user_id = $1 AND next_review_date <= $2
            ORDER BY next_review_date, created_at
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_all(&*self.db)
        .await?;
        Ok(cards)
    }
}
