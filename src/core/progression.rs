// src/core/progression.rs

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::SqliteConnection;

use crate::error::AppError;

/// Cumulative XP required to reach each level (index 0 = level 1).
pub const LEVEL_THRESHOLDS: [i64; 11] = [
    0, 100, 250, 500, 1000, 2000, 3500, 5500, 8500, 13000, 20000,
];

/// Levels past the table each cost another 10,000 XP.
const XP_PER_EXTRA_LEVEL: i64 = 10_000;

/// Outcome of applying XP to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpApplied {
    pub new_xp: i64,
    pub new_level: i64,
    pub leveled_up: bool,
}

/// Level as a step function of lifetime XP:
/// 1 + index of the largest threshold <= total_xp, growing linearly past
/// the end of the table.
pub fn level_for_xp(total_xp: i64) -> i64 {
    let top = LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1];
    if total_xp >= top {
        return LEVEL_THRESHOLDS.len() as i64 + (total_xp - top) / XP_PER_EXTRA_LEVEL;
    }
    LEVEL_THRESHOLDS
        .iter()
        .rposition(|&threshold| threshold <= total_xp)
        .unwrap_or(0) as i64
        + 1
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the calendar month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Applies earned XP to a user's lifetime total and the current week's and
/// month's accumulators, and re-derives the level.
///
/// The lifetime total is bumped with a single atomic increment; the level is
/// derived from the value that increment returns and written with
/// `MAX(level, ?)` so interleaved callers can never regress it. The period
/// rows are upserted with increments keyed by the period active right now.
/// `amount` is always >= 0 in this engine.
pub async fn apply_xp(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: i64,
) -> Result<XpApplied, AppError> {
    let now = Utc::now();

    let new_xp = sqlx::query_scalar::<_, i64>(
        "UPDATE users SET total_xp = total_xp + ?1, last_active_at = ?2 \
         WHERE id = ?3 RETURNING total_xp",
    )
    .bind(amount)
    .bind(now)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let previous_level = level_for_xp(new_xp - amount);
    let new_level = level_for_xp(new_xp);

    sqlx::query("UPDATE users SET level = MAX(level, ?1) WHERE id = ?2")
        .bind(new_level)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    let today = now.date_naive();

    sqlx::query(
        "INSERT INTO weekly_xp (user_id, week_start, xp) VALUES (?1, ?2, ?3) \
         ON CONFLICT(user_id, week_start) DO UPDATE SET xp = xp + excluded.xp",
    )
    .bind(user_id)
    .bind(week_start(today))
    .bind(amount)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO monthly_xp (user_id, month_start, xp) VALUES (?1, ?2, ?3) \
         ON CONFLICT(user_id, month_start) DO UPDATE SET xp = xp + excluded.xp",
    )
    .bind(user_id)
    .bind(month_start(today))
    .bind(amount)
    .execute(&mut *conn)
    .await?;

    Ok(XpApplied {
        new_xp,
        new_level,
        leveled_up: new_level > previous_level,
    })
}
