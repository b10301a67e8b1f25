// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The attempt state machine. `Completed` is terminal; an attempt that is
/// never submitted simply stays `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
}

/// Represents the 'test_attempts' table in the database.
/// Created at start, mutated exactly once at submit, immutable thereafter.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestAttempt {
    pub id: i64,

    /// `None` for anonymous attempts.
    pub user_id: Option<i64>,

    /// `None` when the questions were drawn from all categories.
    pub category_id: Option<i64>,

    /// Fixed at start time; the score denominator even for partial submissions.
    pub total_questions: i64,

    pub correct_answers: i64,

    /// 0-100, round(correct / total * 100).
    pub score: i64,

    pub xp_earned: i64,

    pub status: AttemptStatus,

    pub started_at: chrono::DateTime<chrono::Utc>,

    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'answer_records' table. Created only during submit,
/// never mutated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub selected_answer: i64,
    pub is_correct: bool,
    pub xp_awarded: i64,
    /// Seconds spent on this question, if the client reported it.
    pub time_spent: Option<i64>,
}

/// DTO for starting a test.
#[derive(Debug, Default, Deserialize)]
pub struct StartTestRequest {
    pub category_id: Option<i64>,
    /// Requested question count; clamped to [5, 50], default 10.
    pub count: Option<i64>,
}

/// One submitted answer.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerEntry {
    pub question_id: i64,
    pub selected_answer: i64,
    pub time_spent: Option<i64>,
}

/// DTO for submitting a test attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitTestRequest {
    pub answers: Vec<AnswerEntry>,
}

/// Query parameters for the attempt history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

/// A completed (or in-progress) attempt together with its answer records.
#[derive(Debug, Serialize)]
pub struct TestResultResponse {
    pub attempt: TestAttempt,
    pub answers: Vec<AnswerRecord>,
}
