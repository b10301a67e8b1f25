// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Question difficulty tier. Determines the default XP weight when a
/// question does not set one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn default_weight(self) -> i64 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Medium => 10,
            Difficulty::Hard => 15,
        }
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub category_id: i64,

    /// The text content of the question.
    pub content: String,

    /// The four answer options.
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// Index (0-3) of the correct option.
    pub correct_answer: i64,

    pub difficulty: Difficulty,

    /// Explicit XP weight; `None` falls back to the difficulty tier default.
    pub xp_weight: Option<i64>,

    pub is_active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    /// XP granted for answering this question correctly.
    pub fn weight(&self) -> i64 {
        self.xp_weight
            .unwrap_or_else(|| self.difficulty.default_weight())
    }
}

/// DTO for sending a question to the client (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub category_id: i64,
    pub content: String,
    pub options: Json<Vec<String>>,
    pub difficulty: Difficulty,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            category_id: q.category_id,
            content: q.content,
            options: q.options,
            difficulty: q.difficulty,
        }
    }
}
