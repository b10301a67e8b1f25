// src/core/notify.rs

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::models::achievement::UnlockedAchievement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LevelUp,
    AchievementUnlocked,
}

/// One outbound notification event.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
}

impl Notification {
    pub fn level_up(user_id: i64, level: i64) -> Self {
        Notification {
            user_id,
            title: "Level up!".to_string(),
            message: format!("You reached level {}", level),
            kind: NotificationKind::LevelUp,
            payload: json!({ "level": level }),
        }
    }

    pub fn achievement(user_id: i64, unlocked: &UnlockedAchievement) -> Self {
        Notification {
            user_id,
            title: "Achievement unlocked!".to_string(),
            message: unlocked.title.clone(),
            kind: NotificationKind::AchievementUnlocked,
            payload: json!({
                "code": unlocked.code,
                "xp_reward": unlocked.xp_reward,
            }),
        }
    }
}

/// Delivery backend (push, email, bot, ...). Implementations are external
/// collaborators; the engine only hands events over.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), String>;
}

/// Default sink: writes deliveries to the log.
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), String> {
        tracing::info!(
            user_id = notification.user_id,
            title = %notification.title,
            message = %notification.message,
            "notification"
        );
        Ok(())
    }
}

/// Outbound notification queue, decoupled from request transactions.
///
/// `send` never blocks and never fails the caller; delivery errors are
/// logged by the drain task and swallowed.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn spawn(sink: Arc<dyn NotificationSink>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                if let Err(e) = sink.deliver(&notification).await {
                    tracing::warn!(
                        user_id = notification.user_id,
                        error = %e,
                        "notification delivery failed"
                    );
                }
            }
        });

        Self { tx }
    }

    pub fn send(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::warn!("notification outbox closed, dropping event");
        }
    }
}
