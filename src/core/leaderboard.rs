// src/core/leaderboard.rs

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    core::progression::{month_start, week_start},
    error::AppError,
    models::progress::LeaderboardEntry,
};

/// The population and time window a rank is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Category(i64),
    Weekly,
    Monthly,
}

impl Scope {
    /// Parses the query-string form: `global`, `weekly`, `monthly`, or
    /// `category` plus a category id.
    pub fn parse(scope: &str, category_id: Option<i64>) -> Result<Scope, AppError> {
        match scope {
            "global" => Ok(Scope::Global),
            "weekly" => Ok(Scope::Weekly),
            "monthly" => Ok(Scope::Monthly),
            "category" => category_id.map(Scope::Category).ok_or_else(|| {
                AppError::BadRequest("category scope requires category_id".to_string())
            }),
            other => Err(AppError::BadRequest(format!("Unknown scope '{}'", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Category(_) => "category",
            Scope::Weekly => "weekly",
            Scope::Monthly => "monthly",
        }
    }
}

/// The user's scoring key within the scope, or `None` when the user has no
/// row there (no activity in the window / category).
async fn scope_key(
    conn: &mut SqliteConnection,
    scope: Scope,
    user_id: i64,
) -> Result<Option<i64>, AppError> {
    let today = Utc::now().date_naive();

    let key = match scope {
        Scope::Global => {
            sqlx::query_scalar::<_, i64>("SELECT total_xp FROM users WHERE id = ?1")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?
        }
        Scope::Category(category_id) => {
            sqlx::query_scalar::<_, i64>(
                "SELECT total_xp FROM category_stats WHERE user_id = ?1 AND category_id = ?2",
            )
            .bind(user_id)
            .bind(category_id)
            .fetch_optional(&mut *conn)
            .await?
        }
        Scope::Weekly => {
            sqlx::query_scalar::<_, i64>(
                "SELECT xp FROM weekly_xp WHERE user_id = ?1 AND week_start = ?2",
            )
            .bind(user_id)
            .bind(week_start(today))
            .fetch_optional(&mut *conn)
            .await?
        }
        Scope::Monthly => {
            sqlx::query_scalar::<_, i64>(
                "SELECT xp FROM monthly_xp WHERE user_id = ?1 AND month_start = ?2",
            )
            .bind(user_id)
            .bind(month_start(today))
            .fetch_optional(&mut *conn)
            .await?
        }
    };

    Ok(key)
}

/// Ordinal rank of the user within the scope:
/// `1 + count(peers with strictly greater key)`. Equal keys collapse onto
/// the same rank. Not snapshot-isolated with the XP write path; a rank read
/// racing a write may see either side, never a torn value.
pub async fn rank(
    conn: &mut SqliteConnection,
    scope: Scope,
    user_id: i64,
) -> Result<Option<i64>, AppError> {
    let Some(key) = scope_key(conn, scope, user_id).await? else {
        return Ok(None);
    };

    let today = Utc::now().date_naive();

    let greater = match scope {
        Scope::Global => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE total_xp > ?1")
                .bind(key)
                .fetch_one(&mut *conn)
                .await?
        }
        Scope::Category(category_id) => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM category_stats WHERE category_id = ?1 AND total_xp > ?2",
            )
            .bind(category_id)
            .bind(key)
            .fetch_one(&mut *conn)
            .await?
        }
        Scope::Weekly => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM weekly_xp WHERE week_start = ?1 AND xp > ?2",
            )
            .bind(week_start(today))
            .bind(key)
            .fetch_one(&mut *conn)
            .await?
        }
        Scope::Monthly => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM monthly_xp WHERE month_start = ?1 AND xp > ?2",
            )
            .bind(month_start(today))
            .bind(key)
            .fetch_one(&mut *conn)
            .await?
        }
    };

    Ok(Some(1 + greater))
}

/// Top-N listing for the scope, ordered by key descending. Ties break on row
/// creation order (never on score) so pagination stays deterministic.
pub async fn top(
    conn: &mut SqliteConnection,
    scope: Scope,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    let today = Utc::now().date_naive();

    let entries = match scope {
        Scope::Global => {
            sqlx::query_as::<_, LeaderboardEntry>(
                "SELECT id AS user_id, username, total_xp AS value \
                 FROM users \
                 ORDER BY total_xp DESC, id ASC \
                 LIMIT ?1",
            )
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?
        }
        Scope::Category(category_id) => {
            sqlx::query_as::<_, LeaderboardEntry>(
                "SELECT cs.user_id, u.username, cs.total_xp AS value \
                 FROM category_stats cs \
                 JOIN users u ON u.id = cs.user_id \
                 WHERE cs.category_id = ?1 \
                 ORDER BY cs.total_xp DESC, cs.rowid ASC \
                 LIMIT ?2",
            )
            .bind(category_id)
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?
        }
        Scope::Weekly => {
            sqlx::query_as::<_, LeaderboardEntry>(
                "SELECT w.user_id, u.username, w.xp AS value \
                 FROM weekly_xp w \
                 JOIN users u ON u.id = w.user_id \
                 WHERE w.week_start = ?1 \
                 ORDER BY w.xp DESC, w.rowid ASC \
                 LIMIT ?2",
            )
            .bind(week_start(today))
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?
        }
        Scope::Monthly => {
            sqlx::query_as::<_, LeaderboardEntry>(
                "SELECT m.user_id, u.username, m.xp AS value \
                 FROM monthly_xp m \
                 JOIN users u ON u.id = m.user_id \
                 WHERE m.month_start = ?1 \
                 ORDER BY m.xp DESC, m.rowid ASC \
                 LIMIT ?2",
            )
            .bind(month_start(today))
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?
        }
    };

    Ok(entries)
}
