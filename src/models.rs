use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::srs::{MAX_DIFFICULTY, MIN_DIFFICULTY};

/// Difficulty given to cards created without one.
pub const DEFAULT_DIFFICULTY: i32 = MIN_DIFFICULTY;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub id: Uuid,
    pub user_id: String,
    pub subject_id: Option<Uuid>,
    pub question: String,
    pub answer: String,
    pub difficulty: i32,
    pub next_review_date: NaiveDate,
    pub review_count: i32,
    pub correct_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    /// A card is due once its review date is today or earlier.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date <= today
    }

    pub fn is_new(&self) -> bool {
        self.review_count == 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FlashcardNew {
    pub subject_id: Option<Uuid>,
    pub question: String,
    pub answer: String,
    pub difficulty: Option<i32>,
}

impl FlashcardNew {
    pub fn initial_difficulty(&self) -> i32 {
        self.difficulty.unwrap_or(DEFAULT_DIFFICULTY)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ReviewSubmission {
    pub correct: bool,
}

/// One suggestion in the `generate_flashcards` payload produced by the AI helper.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratedFlashcard {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub difficulty: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FlashcardImport {
    #[serde(default)]
    pub subject_id: Option<Uuid>,
    pub flashcards: Vec<GeneratedFlashcard>,
}

impl FlashcardImport {
    /// Suggestions come from a model, so their difficulty is clamped rather than rejected.
    pub fn into_new_cards(self) -> Vec<FlashcardNew> {
        let subject_id = self.subject_id;
        self.flashcards
            .into_iter()
            .map(|card| FlashcardNew {
                subject_id,
                question: card.question.trim().to_string(),
                answer: card.answer.trim().to_string(),
                difficulty: Some(
                    card.difficulty
                        .unwrap_or(DEFAULT_DIFFICULTY)
                        .clamp(MIN_DIFFICULTY, MAX_DIFFICULTY),
                ),
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct FlashcardStats {
    pub total: usize,
    pub due: usize,
    pub new: usize,
    pub reviews: i64,
    pub correct: i64,
    pub accuracy: f64,
}

impl FlashcardStats {
    pub fn collect(cards: &[Flashcard], today: NaiveDate) -> Self {
        let mut stats = Self {
            total: cards.len(),
            ..Default::default()
        };
        for card in cards {
            if card.is_new() {
                stats.new += 1;
            }
            if card.is_due(today) {
                stats.due += 1;
            }
            stats.reviews += i64::from(card.review_count);
            stats.correct += i64::from(card.correct_count);
        }
        if stats.reviews > 0 {
            stats.accuracy = stats.correct as f64 / stats.reviews as f64;
        }
        stats
    }
}
