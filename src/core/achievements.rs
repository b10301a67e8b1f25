// src/core/achievements.rs

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    core::{
        notify::{Notification, Notifier},
        progression,
    },
    error::AppError,
    models::achievement::{Achievement, UnlockedAchievement},
};

/// Closed set of achievement condition kinds. Parsing happens once at the
/// definition boundary; everything after is a compiler-checked match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Xp(i64),
    Tests(i64),
    Perfect(i64),
    Level(i64),
    Category {
        target: i64,
        /// `None` means the user's best category counts.
        category_id: Option<i64>,
    },
    Categories(i64),
    Ai(i64),
    Rank(i64),
}

impl Condition {
    pub fn parse(kind: &str, value: i64, category_id: Option<i64>) -> Option<Condition> {
        match kind {
            "xp" => Some(Condition::Xp(value)),
            "tests" => Some(Condition::Tests(value)),
            "perfect" => Some(Condition::Perfect(value)),
            "level" => Some(Condition::Level(value)),
            "category" => Some(Condition::Category {
                target: value,
                category_id,
            }),
            "categories" => Some(Condition::Categories(value)),
            "ai" => Some(Condition::Ai(value)),
            "rank" => Some(Condition::Rank(value)),
            _ => None,
        }
    }

    /// Whether the measured progress satisfies the condition.
    ///
    /// Every kind compares with `>=` except `Rank`: a rank is an ordinal
    /// where lower is better, so it alone is satisfied by `progress <= value`.
    pub fn satisfied(&self, progress: i64) -> bool {
        match self {
            Condition::Rank(target) => progress >= 1 && progress <= *target,
            Condition::Xp(target)
            | Condition::Tests(target)
            | Condition::Perfect(target)
            | Condition::Level(target)
            | Condition::Categories(target)
            | Condition::Ai(target) => progress >= *target,
            Condition::Category { target, .. } => progress >= *target,
        }
    }
}

/// Read-only aggregate stats a condition is measured against.
/// Taken once per evaluate call so one pass sees one consistent view.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub total_xp: i64,
    pub level: i64,
    pub tests_completed: i64,
    pub perfect_tests: i64,
    pub ai_messages: i64,
    /// 1 + count of users with strictly greater lifetime XP.
    pub global_rank: i64,
    /// Completed-attempt count per category (categories with none are absent).
    pub category_tests: HashMap<i64, i64>,
}

/// Pure measurement of a condition against a snapshot.
pub fn measure(condition: &Condition, stats: &StatsSnapshot) -> i64 {
    match condition {
        Condition::Xp(_) => stats.total_xp,
        Condition::Tests(_) => stats.tests_completed,
        Condition::Perfect(_) => stats.perfect_tests,
        Condition::Level(_) => stats.level,
        Condition::Ai(_) => stats.ai_messages,
        Condition::Rank(_) => stats.global_rank,
        Condition::Categories(_) => stats.category_tests.len() as i64,
        Condition::Category { category_id, .. } => match category_id {
            Some(id) => stats.category_tests.get(id).copied().unwrap_or(0),
            None => stats.category_tests.values().copied().max().unwrap_or(0),
        },
    }
}

/// Reads the user's current aggregate stats.
pub async fn snapshot_stats(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<StatsSnapshot, AppError> {
    let (total_xp, level) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT total_xp, level FROM users WHERE id = ?1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let tests_completed = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM test_attempts WHERE user_id = ?1 AND status = 'completed'",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    let perfect_tests = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM test_attempts \
         WHERE user_id = ?1 AND status = 'completed' AND score = 100",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    let ai_messages =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ai_messages WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

    let global_rank =
        sqlx::query_scalar::<_, i64>("SELECT 1 + COUNT(*) FROM users WHERE total_xp > ?1")
            .bind(total_xp)
            .fetch_one(&mut *conn)
            .await?;

    let category_tests = sqlx::query_as::<_, (i64, i64)>(
        "SELECT category_id, COUNT(*) FROM test_attempts \
         WHERE user_id = ?1 AND status = 'completed' AND category_id IS NOT NULL \
         GROUP BY category_id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .collect();

    Ok(StatsSnapshot {
        total_xp,
        level,
        tests_completed,
        perfect_tests,
        ai_messages,
        global_rank,
        category_tests,
    })
}

/// Re-evaluates every active achievement for the user and unlocks any newly
/// satisfied ones, exactly once each.
///
/// Progress is written back on every call so in-progress achievements show
/// live numbers. The unlock itself is a compare-and-set on
/// `unlocked_at IS NULL`; only the winner credits the reward XP, so a
/// concurrent evaluate (submit racing a manual re-check) can never award
/// twice. Returns the definitions that transitioned during this call.
pub async fn evaluate(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<UnlockedAchievement>, AppError> {
    let definitions = sqlx::query_as::<_, Achievement>(
        "SELECT id, code, title, description, kind, value, category_id, \
                xp_reward, is_active, created_at \
         FROM achievements WHERE is_active = 1 ORDER BY id",
    )
    .fetch_all(&mut *conn)
    .await?;

    let already_unlocked: HashSet<i64> = sqlx::query_scalar::<_, i64>(
        "SELECT achievement_id FROM user_achievements \
         WHERE user_id = ?1 AND unlocked_at IS NOT NULL",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .collect();

    let stats = snapshot_stats(conn, user_id).await?;
    let now = Utc::now();
    let mut newly_unlocked = Vec::new();

    for def in definitions {
        if already_unlocked.contains(&def.id) {
            continue;
        }

        let Some(condition) = Condition::parse(&def.kind, def.value, def.category_id) else {
            tracing::warn!(achievement = %def.code, kind = %def.kind, "unknown condition kind");
            continue;
        };

        let progress = measure(&condition, &stats);

        sqlx::query(
            "INSERT INTO user_achievements (user_id, achievement_id, progress) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id, achievement_id) DO UPDATE SET progress = excluded.progress",
        )
        .bind(user_id)
        .bind(def.id)
        .bind(progress)
        .execute(&mut *conn)
        .await?;

        if condition.satisfied(progress) {
            let updated = sqlx::query(
                "UPDATE user_achievements SET unlocked_at = ?1 \
                 WHERE user_id = ?2 AND achievement_id = ?3 AND unlocked_at IS NULL",
            )
            .bind(now)
            .bind(user_id)
            .bind(def.id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

            if updated == 1 {
                if def.xp_reward > 0 {
                    progression::apply_xp(conn, user_id, def.xp_reward).await?;
                }
                newly_unlocked.push(UnlockedAchievement {
                    id: def.id,
                    code: def.code.clone(),
                    title: def.title.clone(),
                    xp_reward: def.xp_reward,
                });
            }
        }
    }

    Ok(newly_unlocked)
}

/// Transactional evaluate for callers outside the submit pipeline.
/// Notifications go out after the commit.
pub async fn evaluate_and_notify(
    pool: &SqlitePool,
    notifier: &Notifier,
    user_id: i64,
) -> Result<Vec<UnlockedAchievement>, AppError> {
    let mut tx = pool.begin().await?;
    let unlocked = evaluate(&mut *tx, user_id).await?;
    tx.commit().await?;

    for achievement in &unlocked {
        notifier.send(Notification::achievement(user_id, achievement));
    }

    Ok(unlocked)
}
