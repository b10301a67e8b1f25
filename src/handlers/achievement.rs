// src/handlers/achievement.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    core::{achievements, notify::Notifier},
    error::AppError,
    models::achievement::AchievementProgress,
    utils::jwt::Claims,
};

/// Lists every active achievement with the caller's live progress.
/// Achievements without a progress row yet show zero.
pub async fn list_achievements(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let achievements = sqlx::query_as::<_, AchievementProgress>(
        "SELECT a.id, a.code, a.title, a.description, a.kind, a.value, a.xp_reward, \
                COALESCE(ua.progress, 0) AS progress, ua.unlocked_at \
         FROM achievements a \
         LEFT JOIN user_achievements ua \
                ON ua.achievement_id = a.id AND ua.user_id = ?1 \
         WHERE a.is_active = 1 \
         ORDER BY a.id",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(achievements))
}

/// Re-evaluates the caller's achievements and returns any that just
/// unlocked. Triggered automatically after every submit; this endpoint is
/// the manual re-check.
pub async fn evaluate_achievements(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let unlocked = achievements::evaluate_and_notify(&pool, &notifier, user_id).await?;

    Ok(Json(json!({ "unlocked": unlocked })))
}
