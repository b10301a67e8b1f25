// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        progress::CategoryStat,
        user::{MeResponse, User},
    },
    utils::jwt::Claims,
};

/// Get current user's profile and progression statistics.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password, role, total_xp, level, last_active_at, created_at \
         FROM users WHERE id = ?1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let tests_completed = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM test_attempts WHERE user_id = ?1 AND status = 'completed'",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    let perfect_tests = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM test_attempts \
         WHERE user_id = ?1 AND status = 'completed' AND score = 100",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    let achievements_unlocked = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM user_achievements WHERE user_id = ?1 AND unlocked_at IS NOT NULL",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    let category_stats = sqlx::query_as::<_, CategoryStat>(
        "SELECT user_id, category_id, total_tests, total_xp, average_score, best_score \
         FROM category_stats WHERE user_id = ?1 ORDER BY category_id",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        role: user.role,
        total_xp: user.total_xp,
        level: user.level,
        tests_completed,
        perfect_tests,
        achievements_unlocked,
        category_stats,
        created_at: user.created_at,
    }))
}
