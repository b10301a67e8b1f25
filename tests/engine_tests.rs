// tests/engine_tests.rs
//
// Engine-level tests running directly against a database pool: XP
// arithmetic, achievement unlocks, leaderboard ranks and the attempt
// state machine.

use std::sync::Arc;
use std::time::Duration;

use quizforge::core::leaderboard::{self, Scope};
use quizforge::core::notify::{Notifier, TracingSink};
use quizforge::core::{achievements, progression, session};
use quizforge::error::AppError;
use quizforge::models::attempt::{AnswerEntry, AttemptStatus, TestAttempt};
use quizforge::models::progress::PeriodXp;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

/// Fresh in-memory database with migrations applied.
async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

/// File-backed database for tests that need several concurrent writers.
async fn file_pool(path: &std::path::Path) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to open file-backed database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

fn notifier() -> Notifier {
    Notifier::spawn(Arc::new(TracingSink))
}

async fn create_user(pool: &SqlitePool, username: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, password) VALUES (?1, 'not-a-real-hash') RETURNING id",
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Seeds one question and returns its id. `weight` of `None` leaves the
/// difficulty tier default in effect.
async fn seed_question(
    pool: &SqlitePool,
    category_id: i64,
    correct_answer: i64,
    difficulty: &str,
    weight: Option<i64>,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO questions (category_id, content, options, correct_answer, difficulty, xp_weight) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
    )
    .bind(category_id)
    .bind("What is the answer?")
    .bind(serde_json::json!(["A", "B", "C", "D"]).to_string())
    .bind(correct_answer)
    .bind(difficulty)
    .bind(weight)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn answer(question_id: i64, selected_answer: i64) -> AnswerEntry {
    AnswerEntry {
        question_id,
        selected_answer,
        time_spent: None,
    }
}

async fn fetch_attempt(pool: &SqlitePool, attempt_id: i64) -> TestAttempt {
    sqlx::query_as::<_, TestAttempt>(
        "SELECT id, user_id, category_id, total_questions, correct_answers, score, xp_earned, \
                status, started_at, completed_at \
         FROM test_attempts WHERE id = ?1",
    )
    .bind(attempt_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// ProgressionLedger
// ---------------------------------------------------------------------------

#[tokio::test]
async fn apply_xp_crosses_level_threshold() {
    let pool = memory_pool().await;
    let user_id = create_user(&pool, "climber").await;

    sqlx::query("UPDATE users SET total_xp = 90 WHERE id = ?1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let applied = progression::apply_xp(&mut conn, user_id, 15).await.unwrap();

    assert_eq!(applied.new_xp, 105);
    assert_eq!(applied.new_level, 2);
    assert!(applied.leveled_up);
    drop(conn);

    let (total_xp, level) =
        sqlx::query_as::<_, (i64, i64)>("SELECT total_xp, level FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(total_xp, 105);
    assert_eq!(level, 2);
}

#[tokio::test]
async fn apply_xp_accumulates_period_rows() {
    let pool = memory_pool().await;
    let user_id = create_user(&pool, "weekly").await;

    let mut conn = pool.acquire().await.unwrap();
    progression::apply_xp(&mut conn, user_id, 10).await.unwrap();
    progression::apply_xp(&mut conn, user_id, 25).await.unwrap();
    drop(conn);

    let weekly = sqlx::query_as::<_, PeriodXp>(
        "SELECT user_id, week_start AS period_start, xp FROM weekly_xp WHERE user_id = ?1",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .unwrap();

    // Both grants land in the single current week.
    assert_eq!(weekly.len(), 1);
    assert_eq!(weekly[0].xp, 35);
    assert_eq!(
        weekly[0].period_start,
        progression::week_start(chrono::Utc::now().date_naive())
    );

    let monthly = sqlx::query_as::<_, PeriodXp>(
        "SELECT user_id, month_start AS period_start, xp FROM monthly_xp WHERE user_id = ?1",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].xp, 35);
}

#[tokio::test]
async fn apply_xp_unknown_user_is_not_found() {
    let pool = memory_pool().await;

    let mut conn = pool.acquire().await.unwrap();
    let err = progression::apply_xp(&mut conn, 9999, 10).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_apply_xp_loses_no_updates() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir.path().join("engine.db")).await;
    let user_id = create_user(&pool, "racer").await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut conn = pool.acquire().await.unwrap();
            progression::apply_xp(&mut conn, user_id, 10).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let total_xp = sqlx::query_scalar::<_, i64>("SELECT total_xp FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total_xp, 200);

    let weekly_xp = sqlx::query_scalar::<_, i64>("SELECT xp FROM weekly_xp WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(weekly_xp, 200);
}

// ---------------------------------------------------------------------------
// SessionOrchestrator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_flow_grades_and_progresses() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let user_id = create_user(&pool, "player").await;

    let easy = seed_question(&pool, 2, 0, "easy", None).await;
    let hard = seed_question(&pool, 2, 3, "hard", None).await;

    // Pool only has two questions: requested count degrades silently.
    let started = session::start(&pool, Some(user_id), Some(2), Some(5))
        .await
        .unwrap();
    assert_eq!(started.total_questions, 2);
    assert_eq!(started.questions.len(), 2);

    let attempt = fetch_attempt(&pool, started.attempt_id).await;
    assert_eq!(attempt.status, AttemptStatus::InProgress);
    assert!(attempt.completed_at.is_none());

    let outcome = session::submit(
        &pool,
        &notifier,
        Some(user_id),
        started.attempt_id,
        &[answer(easy, 0), answer(hard, 3)],
    )
    .await
    .unwrap();

    assert_eq!(outcome.total_questions, 2);
    assert_eq!(outcome.correct_answers, 2);
    assert_eq!(outcome.score, 100);
    assert_eq!(outcome.xp_earned, 20);
    assert!(!outcome.leveled_up);

    // First completed test and a perfect score unlock their achievements;
    // as the only player in the database this user also holds rank 1, so the
    // rank-conditioned ones come along.
    let mut codes: Vec<&str> = outcome
        .unlocked_achievements
        .iter()
        .map(|a| a.code.as_str())
        .collect();
    codes.sort();
    assert_eq!(codes, vec!["first_steps", "flawless", "podium", "summit"]);

    // 20 attempt XP + rewards (10 + 25 + 100 + 250).
    let total_xp = sqlx::query_scalar::<_, i64>("SELECT total_xp FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total_xp, 405);

    let attempt = fetch_attempt(&pool, started.attempt_id).await;
    assert_eq!(attempt.status, AttemptStatus::Completed);
    assert!(attempt.completed_at.is_some());
    assert_eq!(attempt.score, 100);
    assert_eq!(attempt.xp_earned, 20);
}

#[tokio::test]
async fn resubmission_is_rejected_and_state_unchanged() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let user_id = create_user(&pool, "repeat").await;

    let q = seed_question(&pool, 1, 0, "easy", None).await;
    let started = session::start(&pool, Some(user_id), Some(1), None).await.unwrap();

    session::submit(&pool, &notifier, Some(user_id), started.attempt_id, &[answer(q, 0)])
        .await
        .unwrap();
    let before = fetch_attempt(&pool, started.attempt_id).await;
    let xp_before = sqlx::query_scalar::<_, i64>("SELECT total_xp FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();

    let err = session::submit(
        &pool,
        &notifier,
        Some(user_id),
        started.attempt_id,
        &[answer(q, 1)],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::AlreadyCompleted));

    let after = fetch_attempt(&pool, started.attempt_id).await;
    assert_eq!(after.score, before.score);
    assert_eq!(after.xp_earned, before.xp_earned);
    assert_eq!(after.completed_at, before.completed_at);

    let xp_after = sqlx::query_scalar::<_, i64>("SELECT total_xp FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(xp_after, xp_before);
}

#[tokio::test]
async fn anonymous_attempt_is_graded_without_progression() {
    let pool = memory_pool().await;
    let notifier = notifier();

    let q = seed_question(&pool, 1, 2, "medium", None).await;
    let started = session::start(&pool, None, Some(1), None).await.unwrap();

    let outcome = session::submit(&pool, &notifier, None, started.attempt_id, &[answer(q, 2)])
        .await
        .unwrap();

    assert_eq!(outcome.score, 100);
    assert_eq!(outcome.xp_earned, 10);
    assert_eq!(outcome.level, None);
    assert!(outcome.unlocked_achievements.is_empty());

    let weekly_rows = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM weekly_xp")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(weekly_rows, 0);

    let attempt = fetch_attempt(&pool, started.attempt_id).await;
    assert_eq!(attempt.status, AttemptStatus::Completed);
}

#[tokio::test]
async fn submit_by_wrong_user_is_not_found() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let owner = create_user(&pool, "owner").await;
    let other = create_user(&pool, "other").await;

    let q = seed_question(&pool, 1, 0, "easy", None).await;
    let started = session::start(&pool, Some(owner), Some(1), None).await.unwrap();

    let err = session::submit(&pool, &notifier, Some(other), started.attempt_id, &[answer(q, 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // The attempt is untouched and the owner can still submit.
    session::submit(&pool, &notifier, Some(owner), started.attempt_id, &[answer(q, 0)])
        .await
        .unwrap();
}

#[tokio::test]
async fn out_of_range_answer_index_is_rejected_before_grading() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let user_id = create_user(&pool, "fumble").await;

    let q = seed_question(&pool, 1, 0, "easy", None).await;
    let started = session::start(&pool, Some(user_id), Some(1), None).await.unwrap();

    let err = session::submit(&pool, &notifier, Some(user_id), started.attempt_id, &[answer(q, 4)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidAnswerIndex(4)));

    // Rejected before any write: the attempt is still open.
    let attempt = fetch_attempt(&pool, started.attempt_id).await;
    assert_eq!(attempt.status, AttemptStatus::InProgress);

    session::submit(&pool, &notifier, Some(user_id), started.attempt_id, &[answer(q, 0)])
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_question_ids_are_ignored_at_submit() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let user_id = create_user(&pool, "stale").await;

    let q = seed_question(&pool, 1, 1, "easy", None).await;
    let started = session::start(&pool, Some(user_id), Some(1), None).await.unwrap();

    let outcome = session::submit(
        &pool,
        &notifier,
        Some(user_id),
        started.attempt_id,
        &[answer(q, 1), answer(987_654, 0)],
    )
    .await
    .unwrap();

    assert_eq!(outcome.correct_answers, 1);
    assert_eq!(outcome.score, 100);

    let answer_rows =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM answer_records WHERE attempt_id = ?1")
            .bind(started.attempt_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(answer_rows, 1);
}

#[tokio::test]
async fn start_with_empty_category_fails() {
    let pool = memory_pool().await;

    // Category 4 exists but holds no questions.
    let err = session::start(&pool, None, Some(4), None).await.unwrap_err();
    assert!(matches!(err, AppError::CategoryEmpty));
}

#[tokio::test]
async fn category_stats_roll_up_incrementally() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let user_id = create_user(&pool, "rollup").await;

    let q1 = seed_question(&pool, 3, 0, "easy", None).await;
    let q2 = seed_question(&pool, 3, 0, "easy", None).await;

    // First attempt: both correct (score 100).
    let first = session::start(&pool, Some(user_id), Some(3), None).await.unwrap();
    session::submit(&pool, &notifier, Some(user_id), first.attempt_id, &[answer(q1, 0), answer(q2, 0)])
        .await
        .unwrap();

    // Second attempt: one correct (score 50).
    let second = session::start(&pool, Some(user_id), Some(3), None).await.unwrap();
    session::submit(&pool, &notifier, Some(user_id), second.attempt_id, &[answer(q1, 0), answer(q2, 1)])
        .await
        .unwrap();

    let (total_tests, total_xp, average_score, best_score) = sqlx::query_as::<_, (i64, i64, f64, i64)>(
        "SELECT total_tests, total_xp, average_score, best_score \
         FROM category_stats WHERE user_id = ?1 AND category_id = 3",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(total_tests, 2);
    assert_eq!(total_xp, 15);
    assert!((average_score - 75.0).abs() < f64::EPSILON);
    assert_eq!(best_score, 100);
}

// ---------------------------------------------------------------------------
// AchievementEvaluator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tenth_test_unlocks_tests_achievement_exactly_once() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let user_id = create_user(&pool, "grinder").await;

    let q = seed_question(&pool, 1, 0, "easy", None).await;

    // Nine completed tests, all answered wrong to keep 'perfect' out of the way.
    for _ in 0..9 {
        let started = session::start(&pool, Some(user_id), Some(1), None).await.unwrap();
        let outcome = session::submit(&pool, &notifier, Some(user_id), started.attempt_id, &[answer(q, 1)])
            .await
            .unwrap();
        assert!(
            !outcome
                .unlocked_achievements
                .iter()
                .any(|a| a.code == "getting_warm")
        );
    }

    // The tenth completion crosses the threshold.
    let started = session::start(&pool, Some(user_id), Some(1), None).await.unwrap();
    let outcome = session::submit(&pool, &notifier, Some(user_id), started.attempt_id, &[answer(q, 1)])
        .await
        .unwrap();
    let hits: Vec<_> = outcome
        .unlocked_achievements
        .iter()
        .filter(|a| a.code == "getting_warm")
        .collect();
    assert_eq!(hits.len(), 1);

    // And never again.
    let started = session::start(&pool, Some(user_id), Some(1), None).await.unwrap();
    let outcome = session::submit(&pool, &notifier, Some(user_id), started.attempt_id, &[answer(q, 1)])
        .await
        .unwrap();
    assert!(
        !outcome
            .unlocked_achievements
            .iter()
            .any(|a| a.code == "getting_warm")
    );
}

#[tokio::test]
async fn evaluate_is_idempotent_and_never_double_rewards() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let user_id = create_user(&pool, "idempotent").await;

    let q = seed_question(&pool, 1, 0, "easy", None).await;
    let started = session::start(&pool, Some(user_id), Some(1), None).await.unwrap();
    session::submit(&pool, &notifier, Some(user_id), started.attempt_id, &[answer(q, 0)])
        .await
        .unwrap();

    let xp_after_submit = sqlx::query_scalar::<_, i64>("SELECT total_xp FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let unlocked = achievements::evaluate(&mut conn, user_id).await.unwrap();
    assert!(unlocked.is_empty());
    drop(conn);

    let xp_after_reevaluate = sqlx::query_scalar::<_, i64>("SELECT total_xp FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(xp_after_reevaluate, xp_after_submit);
}

#[tokio::test]
async fn unlock_survives_decreasing_progress() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let user_id = create_user(&pool, "monotone").await;

    let q = seed_question(&pool, 1, 0, "easy", None).await;
    let started = session::start(&pool, Some(user_id), Some(1), None).await.unwrap();
    session::submit(&pool, &notifier, Some(user_id), started.attempt_id, &[answer(q, 0)])
        .await
        .unwrap();

    let flawless_id =
        sqlx::query_scalar::<_, i64>("SELECT id FROM achievements WHERE code = 'flawless'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let unlocked_at = sqlx::query_scalar::<_, Option<chrono::DateTime<chrono::Utc>>>(
        "SELECT unlocked_at FROM user_achievements WHERE user_id = ?1 AND achievement_id = ?2",
    )
    .bind(user_id)
    .bind(flawless_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(unlocked_at.is_some());

    // The underlying stat later decreases (e.g. an administrative rescore).
    sqlx::query("UPDATE test_attempts SET score = 90 WHERE id = ?1")
        .bind(started.attempt_id)
        .execute(&pool)
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let unlocked = achievements::evaluate(&mut conn, user_id).await.unwrap();
    drop(conn);
    assert!(unlocked.iter().all(|a| a.code != "flawless"));

    let still_unlocked = sqlx::query_scalar::<_, Option<chrono::DateTime<chrono::Utc>>>(
        "SELECT unlocked_at FROM user_achievements WHERE user_id = ?1 AND achievement_id = ?2",
    )
    .bind(user_id)
    .bind(flawless_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(still_unlocked, unlocked_at);
}

#[tokio::test]
async fn evaluate_tracks_progress_before_completion() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let user_id = create_user(&pool, "partway").await;

    let q = seed_question(&pool, 1, 0, "easy", None).await;
    for _ in 0..3 {
        let started = session::start(&pool, Some(user_id), Some(1), None).await.unwrap();
        session::submit(&pool, &notifier, Some(user_id), started.attempt_id, &[answer(q, 1)])
            .await
            .unwrap();
    }

    let getting_warm_id =
        sqlx::query_scalar::<_, i64>("SELECT id FROM achievements WHERE code = 'getting_warm'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let (progress, unlocked_at) = sqlx::query_as::<_, (i64, Option<chrono::DateTime<chrono::Utc>>)>(
        "SELECT progress, unlocked_at FROM user_achievements \
         WHERE user_id = ?1 AND achievement_id = ?2",
    )
    .bind(user_id)
    .bind(getting_warm_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(progress, 3);
    assert!(unlocked_at.is_none());
}

// ---------------------------------------------------------------------------
// LeaderboardRanker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rank_counts_strictly_greater_keys() {
    let pool = memory_pool().await;
    let leader = create_user(&pool, "leader").await;
    let tied_a = create_user(&pool, "tied_a").await;
    let tied_b = create_user(&pool, "tied_b").await;

    let mut conn = pool.acquire().await.unwrap();
    progression::apply_xp(&mut conn, leader, 100).await.unwrap();
    progression::apply_xp(&mut conn, tied_a, 50).await.unwrap();
    progression::apply_xp(&mut conn, tied_b, 50).await.unwrap();

    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Global, leader).await.unwrap(),
        Some(1)
    );
    // Equal keys collapse onto the same rank, no gaps below the tie.
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Global, tied_a).await.unwrap(),
        Some(2)
    );
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Global, tied_b).await.unwrap(),
        Some(2)
    );

    // Weekly mirrors the same arithmetic over the period accumulator.
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Weekly, leader).await.unwrap(),
        Some(1)
    );
}

#[tokio::test]
async fn rank_is_none_without_activity_in_scope() {
    let pool = memory_pool().await;
    let idler = create_user(&pool, "idler").await;

    let mut conn = pool.acquire().await.unwrap();

    // No weekly row yet: undefined, not last place.
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Weekly, idler).await.unwrap(),
        None
    );
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Monthly, idler).await.unwrap(),
        None
    );
    // The global scope always has a row for an existing user.
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Global, idler).await.unwrap(),
        Some(1)
    );
    // An unknown user has no rank anywhere.
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Global, 9999).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn top_n_orders_by_key_with_stable_ties() {
    let pool = memory_pool().await;
    let first = create_user(&pool, "first").await;
    let second = create_user(&pool, "second").await;
    let third = create_user(&pool, "third").await;

    let mut conn = pool.acquire().await.unwrap();
    progression::apply_xp(&mut conn, first, 30).await.unwrap();
    progression::apply_xp(&mut conn, second, 70).await.unwrap();
    progression::apply_xp(&mut conn, third, 30).await.unwrap();

    let entries = leaderboard::top(&mut conn, Scope::Global, 10).await.unwrap();
    let order: Vec<i64> = entries.iter().map(|e| e.user_id).collect();

    // 70 first, then the tied 30s in creation order.
    assert_eq!(order, vec![second, first, third]);
    assert_eq!(entries[0].value, 70);

    let top_two = leaderboard::top(&mut conn, Scope::Global, 2).await.unwrap();
    assert_eq!(top_two.len(), 2);
    assert_eq!(top_two[1].user_id, first);
}

#[tokio::test]
async fn category_scope_ranks_by_category_xp() {
    let pool = memory_pool().await;
    let notifier = notifier();
    let ace = create_user(&pool, "ace").await;
    let novice = create_user(&pool, "novice").await;

    let q = seed_question(&pool, 2, 0, "hard", None).await;

    let started = session::start(&pool, Some(ace), Some(2), None).await.unwrap();
    session::submit(&pool, &notifier, Some(ace), started.attempt_id, &[answer(q, 0)])
        .await
        .unwrap();

    let started = session::start(&pool, Some(novice), Some(2), None).await.unwrap();
    session::submit(&pool, &notifier, Some(novice), started.attempt_id, &[answer(q, 1)])
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Category(2), ace).await.unwrap(),
        Some(1)
    );
    // 0 category XP still ranks (a row exists), behind the 15-XP ace.
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Category(2), novice).await.unwrap(),
        Some(2)
    );
    // No attempts in another category: no row, no rank.
    assert_eq!(
        leaderboard::rank(&mut conn, Scope::Category(3), ace).await.unwrap(),
        None
    );
}
