//! Spaced-repetition scheduling for flashcards.
//!
//! The interval is derived from the card's difficulty (1..=5): a correct
//! answer schedules it `2 * difficulty` days out (at most 30) and raises the
//! difficulty by one; a wrong answer schedules it `difficulty / 2` days out
//! (at least one) and lowers it by one.
use chrono::{Days, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{errors::ApiError, models::Flashcard, store::FlashcardStore};

pub const MIN_DIFFICULTY: i32 = 1;
pub const MAX_DIFFICULTY: i32 = 5;
pub const MAX_INTERVAL_DAYS: i32 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("flashcard has a negative review count ({0})")]
    NegativeReviewCount(i32),
    #[error("flashcard has a negative correct count ({0})")]
    NegativeCorrectCount(i32),
    #[error("review counter overflow")]
    CounterOverflow,
    #[error("next review date out of range")]
    DateOutOfRange,
}

/// Source of the calendar date a review is recorded on.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

fn interval_days(difficulty: i32, correct: bool) -> i32 {
    if correct {
        (difficulty * 2).min(MAX_INTERVAL_DAYS)
    } else {
        (difficulty / 2).max(1)
    }
}

fn next_difficulty(difficulty: i32, correct: bool) -> i32 {
    if correct {
        (difficulty + 1).min(MAX_DIFFICULTY)
    } else {
        (difficulty - 1).max(MIN_DIFFICULTY)
    }
}

/// Computes the state of `card` after one review recorded on `today`.
///
/// Out-of-range difficulty from legacy rows is clamped before use. Negative
/// counters mean the stored row is corrupt and are rejected.
pub fn review(
    card: &Flashcard,
    correct: bool,
    today: NaiveDate,
) -> Result<Flashcard, ReviewError> {
    if card.review_count < 0 {
        return Err(ReviewError::NegativeReviewCount(card.review_count));
    }
    if card.correct_count < 0 {
        return Err(ReviewError::NegativeCorrectCount(card.correct_count));
    }

    let review_count = card
        .review_count
        .checked_add(1)
        .ok_or(ReviewError::CounterOverflow)?;
    let correct_count = if correct {
        card.correct_count
            .checked_add(1)
            .ok_or(ReviewError::CounterOverflow)?
    } else {
        card.correct_count
    };

    let base = card.difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    let days = interval_days(base, correct);
    let next_review_date = today
        .checked_add_days(Days::new(days as u64))
        .ok_or(ReviewError::DateOutOfRange)?;

    Ok(Flashcard {
        difficulty: next_difficulty(base, correct),
        next_review_date,
        review_count,
        correct_count,
        ..card.clone()
    })
}

/// Loads a card for `user_id`, reviews it and persists the result.
///
/// The write only applies if nobody else reviewed the card in between.
pub async fn record_review<S: FlashcardStore>(
    store: &S,
    clock: &dyn Clock,
    id: Uuid,
    user_id: &str,
    correct: bool,
) -> Result<Flashcard, ApiError> {
    let card = store
        .load_flashcard(id, user_id)
        .await?
        .ok_or(ApiError::FlashcardNotFound)?;
    let today = clock.today();
    let updated = review(&card, correct, today)?;
    debug!(
        "Flashcard {} reviewed (correct: {}): difficulty {} -> {}, next review {}",
        id, correct, card.difficulty, updated.difficulty, updated.next_review_date
    );

    let saved = store
        .save_reviewed_flashcard(&updated, card.review_count)
        .await?;
    info!("Flashcard {} scheduled for {}", saved.id, saved.next_review_date);
    Ok(saved)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::test::card;
    use crate::store::{StoreError, memory::MemoryFlashcardStore};
    use crate::models::FlashcardNew;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn days_after(date: NaiveDate, n: u64) -> NaiveDate {
        date.checked_add_days(Days::new(n)).unwrap()
    }

    #[test]
    fn test_difficulty_steps_and_clamps() {
        for d in MIN_DIFFICULTY..=MAX_DIFFICULTY {
            let c = card(d, 0, 0);
            assert_eq!(review(&c, true, today()).unwrap().difficulty, (d + 1).min(5));
            assert_eq!(review(&c, false, today()).unwrap().difficulty, (d - 1).max(1));
        }
    }

    #[test]
    fn test_counters() {
        let c = card(3, 7, 4);
        let passed = review(&c, true, today()).unwrap();
        assert_eq!(passed.review_count, 8);
        assert_eq!(passed.correct_count, 5);

        let failed = review(&c, false, today()).unwrap();
        assert_eq!(failed.review_count, 8);
        assert_eq!(failed.correct_count, 4);
    }

    #[test]
    fn test_next_review_is_always_in_the_future() {
        for d in MIN_DIFFICULTY..=MAX_DIFFICULTY {
            for correct in [true, false] {
                let next = review(&card(d, 0, 0), correct, today()).unwrap();
                assert!(next.next_review_date > today(), "d={d} correct={correct}");
            }
        }
    }

    #[test]
    fn test_scenarios() {
        let cases = [
            (1, true, 2, 2),
            (5, true, 10, 5),
            (1, false, 1, 1),
            (4, false, 2, 3),
        ];
        for (difficulty, correct, days, expected) in cases {
            let next = review(&card(difficulty, 0, 0), correct, today()).unwrap();
            assert_eq!(next.next_review_date, days_after(today(), days));
            assert_eq!(next.difficulty, expected);
        }
    }

    #[test]
    fn test_other_fields_untouched() {
        let c = card(2, 1, 1);
        let next = review(&c, true, today()).unwrap();
        assert_eq!(next.id, c.id);
        assert_eq!(next.user_id, c.user_id);
        assert_eq!(next.question, c.question);
        assert_eq!(next.answer, c.answer);
        assert_eq!(next.updated_at, c.updated_at);
    }

    #[test]
    fn test_chained_reviews_depend_on_history() {
        let mut c = card(1, 0, 0);
        let mut day = today();
        let mut last_due = day;
        for _ in 0..3 {
            c = review(&c, true, day).unwrap();
            assert!(c.next_review_date > last_due);
            last_due = c.next_review_date;
            day = c.next_review_date;
        }
        assert_eq!(c.difficulty, 4);
        assert_eq!(c.review_count, 3);
        assert_eq!(c.correct_count, 3);

        // Same outcome on the same day, different result: review is not idempotent.
        let first = review(&card(1, 0, 0), true, today()).unwrap();
        let second = review(&first, true, today()).unwrap();
        assert_ne!(first.next_review_date, second.next_review_date);
        assert_ne!(first.difficulty, second.difficulty);
    }

    #[test]
    fn test_corrupt_difficulty_is_clamped() {
        let high = review(&card(42, 0, 0), true, today()).unwrap();
        assert_eq!(high.difficulty, 5);
        assert_eq!(high.next_review_date, days_after(today(), 10));

        let low = review(&card(-3, 0, 0), false, today()).unwrap();
        assert_eq!(low.difficulty, 1);
        assert_eq!(low.next_review_date, days_after(today(), 1));
    }

    #[test]
    fn test_negative_counters_rejected() {
        assert_eq!(
            review(&card(2, -1, 0), true, today()),
            Err(ReviewError::NegativeReviewCount(-1))
        );
        assert_eq!(
            review(&card(2, 3, -2), false, today()),
            Err(ReviewError::NegativeCorrectCount(-2))
        );
        assert_eq!(
            review(&card(2, i32::MAX, 0), false, today()),
            Err(ReviewError::CounterOverflow)
        );
    }

    #[tokio::test]
    async fn test_record_review_persists() {
        let store = MemoryFlashcardStore::new();
        let clock = FixedClock(today());
        let created = store
            .create_flashcard(
                "user-1",
                FlashcardNew {
                    subject_id: None,
                    question: "2 + 2".to_string(),
                    answer: "4".to_string(),
                    difficulty: Some(4),
                },
                today(),
            )
            .await
            .unwrap();

        let reviewed = record_review(&store, &clock, created.id, "user-1", false)
            .await
            .unwrap();
        assert_eq!(reviewed.difficulty, 3);
        assert_eq!(reviewed.next_review_date, days_after(today(), 2));

        let stored = store
            .load_flashcard(created.id, "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.review_count, 1);
        assert_eq!(stored.correct_count, 0);
        assert!(!stored.is_due(today()));
    }

    #[tokio::test]
    async fn test_record_review_wrong_user() {
        let store = MemoryFlashcardStore::new();
        let clock = FixedClock(today());
        let created = store
            .create_flashcard(
                "owner",
                FlashcardNew {
                    subject_id: None,
                    question: "q".to_string(),
                    answer: "a".to_string(),
                    difficulty: None,
                },
                today(),
            )
            .await
            .unwrap();

        let result = record_review(&store, &clock, created.id, "intruder", true).await;
        assert!(matches!(result, Err(ApiError::FlashcardNotFound)));
        let untouched = store.load_flashcard(created.id, "owner").await.unwrap().unwrap();
        assert_eq!(untouched.review_count, 0);
    }

    #[tokio::test]
    async fn test_stale_review_conflicts() {
        let store = MemoryFlashcardStore::new();
        let created = store
            .create_flashcard(
                "user-1",
                FlashcardNew {
                    subject_id: None,
                    question: "q".to_string(),
                    answer: "a".to_string(),
                    difficulty: Some(2),
                },
                today(),
            )
            .await
            .unwrap();

        let first = review(&created, true, today()).unwrap();
        let second = review(&created, false, today()).unwrap();
        store.save_reviewed_flashcard(&first, 0).await.unwrap();
        let lost = store.save_reviewed_flashcard(&second, 0).await;
        assert!(matches!(lost, Err(StoreError::Conflict)));
    }
}
