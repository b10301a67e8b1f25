// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    core::{notify::Notifier, session},
    error::AppError,
    models::attempt::{HistoryParams, StartTestRequest, SubmitTestRequest},
    utils::jwt::{Claims, CurrentUser},
};

/// Starts a test attempt. Anonymous callers are allowed; their attempts are
/// graded but never progress a profile.
pub async fn start_test(
    State(pool): State<SqlitePool>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<StartTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let started = session::start(&pool, user_id, payload.category_id, payload.count).await?;

    Ok((StatusCode::CREATED, Json(started)))
}

/// Submits answers for an attempt. Grading, progression and achievement
/// evaluation happen in one unit of work; resubmission yields 409.
pub async fn submit_test(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(attempt_id): Path<i64>,
    Json(payload): Json<SubmitTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = session::submit(&pool, &notifier, user_id, attempt_id, &payload.answers).await?;

    Ok(Json(outcome))
}

/// Fetches one attempt with its answer records.
pub async fn get_result(
    State(pool): State<SqlitePool>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = session::get_result(&pool, user_id, attempt_id).await?;

    Ok(Json(result))
}

/// Lists the caller's completed attempts, newest first.
pub async fn get_history(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);
    let limit = params.limit.unwrap_or(20).min(100);

    let attempts = session::history(&pool, user_id, limit).await?;

    Ok(Json(attempts))
}
