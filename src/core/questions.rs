// src/core/questions.rs

use sqlx::SqliteConnection;

use crate::{error::AppError, models::question::Question};

/// Draws up to `count` random active questions, scoped to a category when
/// one is given.
///
/// A pool smaller than `count` degrades silently to fewer questions; only an
/// empty pool is an error (`CategoryEmpty`).
pub async fn random_questions(
    conn: &mut SqliteConnection,
    category_id: Option<i64>,
    count: i64,
) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, category_id, content, options, correct_answer, difficulty, \
                xp_weight, is_active, created_at \
         FROM questions \
         WHERE is_active = 1 AND (?1 IS NULL OR category_id = ?1) \
         ORDER BY RANDOM() \
         LIMIT ?2",
    )
    .bind(category_id)
    .bind(count)
    .fetch_all(&mut *conn)
    .await?;

    if questions.is_empty() {
        return Err(AppError::CategoryEmpty);
    }

    Ok(questions)
}
