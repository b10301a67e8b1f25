// src/handlers/leaderboard.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    core::leaderboard::{self, Scope},
    error::AppError,
    models::progress::RankResponse,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub scope: Option<String>,
    pub category_id: Option<i64>,
    pub limit: Option<i64>,
}

/// Top-N listing for a scope (default: global).
pub async fn top_n(
    State(pool): State<SqlitePool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let scope = Scope::parse(
        params.scope.as_deref().unwrap_or("global"),
        params.category_id,
    )?;
    let limit = params.limit.unwrap_or(10).min(100);

    let mut conn = pool.acquire().await?;
    let entries = leaderboard::top(&mut conn, scope, limit).await?;

    Ok(Json(entries))
}

/// The caller's rank within a scope. `rank` is null when the caller has no
/// activity in the scope.
pub async fn my_rank(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);
    let scope = Scope::parse(
        params.scope.as_deref().unwrap_or("global"),
        params.category_id,
    )?;

    let mut conn = pool.acquire().await?;
    let rank = leaderboard::rank(&mut conn, scope, user_id).await?;

    Ok(Json(RankResponse {
        scope: scope.as_str().to_string(),
        rank,
    }))
}
