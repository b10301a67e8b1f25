// src/models/achievement.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'achievements' table: an immutable condition plus a
/// one-time XP reward.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,

    /// Stable machine-readable identifier, e.g. 'first_steps'.
    pub code: String,

    pub title: String,

    pub description: String,

    /// Condition kind: xp | tests | perfect | level | category | categories | ai | rank.
    pub kind: String,

    /// The threshold the measured progress is compared against.
    pub value: i64,

    /// Only meaningful for kind = 'category'; `None` there means
    /// "best category counts".
    pub category_id: Option<i64>,

    pub xp_reward: i64,

    pub is_active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'user_achievements' table, unique per (user, achievement).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserAchievement {
    pub user_id: i64,
    pub achievement_id: i64,
    /// Latest measured value for the condition.
    pub progress: i64,
    /// Set exactly once on the not-completed -> completed transition,
    /// never cleared afterwards.
    pub unlocked_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// An achievement that transitioned to unlocked during an evaluate call.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockedAchievement {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub xp_reward: i64,
}

/// Joined row for the achievement listing: definition plus the caller's
/// live progress (zero when no row exists yet).
#[derive(Debug, FromRow, Serialize)]
pub struct AchievementProgress {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub value: i64,
    pub xp_reward: i64,
    pub progress: i64,
    pub unlocked_at: Option<chrono::DateTime<chrono::Utc>>,
}
