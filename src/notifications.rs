use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};

use crate::config::{EVENT_CHANNEL_CAPACITY, NOTIFICATION_BUFFER_SIZE};

/// A non-blocking toast for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

pub struct NotificationCenter {
    buffer: RwLock<VecDeque<Notification>>,
    sender: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            buffer: RwLock::new(VecDeque::with_capacity(NOTIFICATION_BUFFER_SIZE)),
            sender,
        }
    }

    pub async fn push(&self, notification: Notification) {
        let mut buf = self.buffer.write().await;
        if buf.len() >= NOTIFICATION_BUFFER_SIZE {
            buf.pop_front();
        }
        buf.push_back(notification.clone());
        drop(buf);

        let _ = self.sender.send(notification);
    }

    pub async fn history(&self) -> Vec<Notification> {
        self.buffer.read().await.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub async fn emit(&self, kind: NotificationKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            NotificationKind::Error => error!("Toast: {}", message),
            NotificationKind::Warning => warn!("Toast: {}", message),
            NotificationKind::Success | NotificationKind::Info => info!("Toast: {}", message),
        }
        self.push(Notification {
            timestamp: Utc::now(),
            kind,
            message,
        })
        .await;
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}
