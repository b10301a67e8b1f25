// src/core/session.rs

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    core::{
        achievements,
        notify::{Notification, Notifier},
        progression, questions,
        scoring::{self, QuestionKey},
    },
    error::AppError,
    models::{
        achievement::UnlockedAchievement,
        attempt::{AnswerEntry, AnswerRecord, AttemptStatus, TestAttempt, TestResultResponse},
        question::{PublicQuestion, Question},
    },
};

const DEFAULT_QUESTION_COUNT: i64 = 10;
const MIN_QUESTION_COUNT: i64 = 5;
const MAX_QUESTION_COUNT: i64 = 50;

const ATTEMPT_COLUMNS: &str = "id, user_id, category_id, total_questions, correct_answers, \
                               score, xp_earned, status, started_at, completed_at";

/// A freshly started attempt: the id plus the questions with their correct
/// answers stripped.
#[derive(Debug, Serialize)]
pub struct StartedTest {
    pub attempt_id: i64,
    pub total_questions: i64,
    pub questions: Vec<PublicQuestion>,
}

/// Outcome of a successful submit.
#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub attempt_id: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub score: i64,
    pub xp_earned: i64,
    /// `None` for anonymous attempts, which are graded but never progress
    /// a profile.
    pub level: Option<i64>,
    pub leveled_up: bool,
    pub unlocked_achievements: Vec<UnlockedAchievement>,
}

/// Starts a new attempt: draws the question set, fixes `total_questions`,
/// and records the set so submit grades against exactly these questions.
///
/// `count` defaults to 10 and is clamped into [5, 50]. A pool smaller than
/// `count` silently yields a shorter test; an empty pool is `CategoryEmpty`.
pub async fn start(
    pool: &SqlitePool,
    user_id: Option<i64>,
    category_id: Option<i64>,
    count: Option<i64>,
) -> Result<StartedTest, AppError> {
    let count = count
        .unwrap_or(DEFAULT_QUESTION_COUNT)
        .clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT);

    let mut tx = pool.begin().await?;

    let questions = questions::random_questions(&mut tx, category_id, count).await?;
    let total_questions = questions.len() as i64;

    let attempt_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO test_attempts (user_id, category_id, total_questions, status, started_at) \
         VALUES (?1, ?2, ?3, 'in_progress', ?4) RETURNING id",
    )
    .bind(user_id)
    .bind(category_id)
    .bind(total_questions)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    for (position, question) in questions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO attempt_questions (attempt_id, question_id, position) \
             VALUES (?1, ?2, ?3)",
        )
        .bind(attempt_id)
        .bind(question.id)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(StartedTest {
        attempt_id,
        total_questions,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    })
}

/// Submits an attempt: grades it, persists the answer records, and performs
/// the attempt's single mutation to `completed`.
///
/// Scoring, answer records, the attempt update, XP, category stats and
/// achievement evaluation commit or roll back as one unit, so a failed
/// submit leaves `completed_at` null and the client may retry safely.
/// Resubmission is rejected with `AlreadyCompleted`, also when two submits
/// race (the status update is a compare-and-set). Anonymous attempts skip
/// progression, stats and achievements entirely.
pub async fn submit(
    pool: &SqlitePool,
    notifier: &Notifier,
    user_id: Option<i64>,
    attempt_id: i64,
    answers: &[AnswerEntry],
) -> Result<SubmitOutcome, AppError> {
    for answer in answers {
        if !(0..=3).contains(&answer.selected_answer) {
            return Err(AppError::InvalidAnswerIndex(answer.selected_answer));
        }
    }

    let mut tx = pool.begin().await?;

    let attempt = sqlx::query_as::<_, TestAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM test_attempts WHERE id = ?1 AND user_id IS ?2"
    ))
    .bind(attempt_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

    if attempt.status == AttemptStatus::Completed {
        return Err(AppError::AlreadyCompleted);
    }

    // Answer key for the set fixed at start time.
    let key: HashMap<i64, QuestionKey> = sqlx::query_as::<_, Question>(
        "SELECT q.id, q.category_id, q.content, q.options, q.correct_answer, \
                q.difficulty, q.xp_weight, q.is_active, q.created_at \
         FROM attempt_questions aq \
         JOIN questions q ON q.id = aq.question_id \
         WHERE aq.attempt_id = ?1",
    )
    .bind(attempt_id)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|q| {
        (
            q.id,
            QuestionKey {
                correct_answer: q.correct_answer,
                xp_weight: q.weight(),
            },
        )
    })
    .collect();

    let (graded, summary) = scoring::grade(answers, &key, attempt.total_questions);

    let updated = sqlx::query(
        "UPDATE test_attempts \
         SET status = 'completed', completed_at = ?1, correct_answers = ?2, \
             score = ?3, xp_earned = ?4 \
         WHERE id = ?5 AND status = 'in_progress'",
    )
    .bind(Utc::now())
    .bind(summary.correct_answers)
    .bind(summary.score)
    .bind(summary.total_xp)
    .bind(attempt_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        // Lost the race against a concurrent submit of the same attempt.
        return Err(AppError::AlreadyCompleted);
    }

    for answer in &graded {
        sqlx::query(
            "INSERT INTO answer_records \
             (attempt_id, question_id, selected_answer, is_correct, xp_awarded, time_spent) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(attempt_id)
        .bind(answer.question_id)
        .bind(answer.selected_answer)
        .bind(answer.is_correct)
        .bind(answer.xp_awarded)
        .bind(answer.time_spent)
        .execute(&mut *tx)
        .await?;
    }

    let mut level = None;
    let mut leveled_up = false;
    let mut unlocked_achievements = Vec::new();

    if let Some(owner_id) = attempt.user_id {
        let applied = progression::apply_xp(&mut tx, owner_id, summary.total_xp).await?;
        level = Some(applied.new_level);
        leveled_up = applied.leveled_up;

        if let Some(category_id) = attempt.category_id {
            sqlx::query(
                "INSERT INTO category_stats \
                 (user_id, category_id, total_tests, total_xp, average_score, best_score) \
                 VALUES (?1, ?2, 1, ?3, ?4, ?5) \
                 ON CONFLICT(user_id, category_id) DO UPDATE SET \
                     average_score = (category_stats.average_score * category_stats.total_tests \
                                      + excluded.average_score) / (category_stats.total_tests + 1), \
                     total_tests = category_stats.total_tests + 1, \
                     total_xp = category_stats.total_xp + excluded.total_xp, \
                     best_score = MAX(category_stats.best_score, excluded.best_score)",
            )
            .bind(owner_id)
            .bind(category_id)
            .bind(summary.total_xp)
            .bind(summary.score as f64)
            .bind(summary.score)
            .execute(&mut *tx)
            .await?;
        }

        unlocked_achievements = achievements::evaluate(&mut tx, owner_id).await?;
    }

    tx.commit().await?;

    // Best-effort side channel, after the unit of work is durable.
    if let Some(owner_id) = attempt.user_id {
        if leveled_up {
            if let Some(new_level) = level {
                notifier.send(Notification::level_up(owner_id, new_level));
            }
        }
        for achievement in &unlocked_achievements {
            notifier.send(Notification::achievement(owner_id, achievement));
        }
    }

    Ok(SubmitOutcome {
        attempt_id,
        total_questions: attempt.total_questions,
        correct_answers: summary.correct_answers,
        score: summary.score,
        xp_earned: summary.total_xp,
        level,
        leveled_up,
        unlocked_achievements,
    })
}

/// Fetches an attempt together with its answer records, owner-checked.
pub async fn get_result(
    pool: &SqlitePool,
    user_id: Option<i64>,
    attempt_id: i64,
) -> Result<TestResultResponse, AppError> {
    let attempt = sqlx::query_as::<_, TestAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM test_attempts WHERE id = ?1 AND user_id IS ?2"
    ))
    .bind(attempt_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

    let answers = sqlx::query_as::<_, AnswerRecord>(
        "SELECT id, attempt_id, question_id, selected_answer, is_correct, xp_awarded, time_spent \
         FROM answer_records WHERE attempt_id = ?1 ORDER BY id",
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await?;

    Ok(TestResultResponse { attempt, answers })
}

/// Completed attempts for the user, newest first.
pub async fn history(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<TestAttempt>, AppError> {
    let attempts = sqlx::query_as::<_, TestAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM test_attempts \
         WHERE user_id = ?1 AND status = 'completed' \
         ORDER BY completed_at DESC \
         LIMIT ?2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(attempts)
}
