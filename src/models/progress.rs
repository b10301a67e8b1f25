// src/models/progress.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A time-windowed XP accumulator row ('weekly_xp' / 'monthly_xp').
/// The accumulator resets implicitly when the period start changes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PeriodXp {
    pub user_id: i64,
    /// Monday of the ISO week, or the first day of the calendar month.
    pub period_start: chrono::NaiveDate,
    pub xp: i64,
}

/// Represents the 'category_stats' table: per (user, category) rollup,
/// updated incrementally on every completed attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CategoryStat {
    pub user_id: i64,
    pub category_id: i64,
    pub total_tests: i64,
    pub total_xp: i64,
    /// Running weighted mean of attempt scores.
    pub average_score: f64,
    /// Running max of attempt scores.
    pub best_score: i64,
}

/// One row of a top-N leaderboard listing.
#[derive(Debug, FromRow, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    /// The scope's scoring key (lifetime, category, weekly or monthly XP).
    pub value: i64,
}

/// Response for a single-user rank query. `rank` is `None` when the user has
/// no row in the scope (e.g. no activity this week) rather than last place.
#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub scope: String,
    pub rank: Option<i64>,
}
