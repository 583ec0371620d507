use std::collections::VecDeque;
use std::time::Duration;

use bazaar_db::models::{Notification, NotificationId, NotificationType};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

use super::style::{NotificationStyle, style_for};

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub notification_id: NotificationId,
    pub notification_type: NotificationType,
    /// Untrusted server text; render as plain text only.
    pub title: String,
    pub body: String,
    pub style: NotificationStyle,
    pub created_at: DateTime<Utc>,
    pub expires_at: Instant,
}

/// Bounded queue of visible toasts, oldest first. Pushing past the bound
/// evicts the oldest toast immediately.
pub struct ToastQueue {
    visible: VecDeque<Toast>,
    max_visible: usize,
    ttl: Duration,
}

impl ToastQueue {
    pub fn new(max_visible: usize, ttl: Duration) -> Self {
        Self {
            visible: VecDeque::with_capacity(max_visible + 1),
            max_visible,
            ttl,
        }
    }

    /// Shows a toast for `notification`. Returns the new toast and the one
    /// evicted to make room, if any.
    pub fn push(&mut self, notification: &Notification, now: Instant) -> (Toast, Option<Toast>) {
        let evicted = if self.visible.len() >= self.max_visible {
            self.visible.pop_front()
        } else {
            None
        };

        let toast = Toast {
            id: Uuid::new_v4(),
            notification_id: notification.id.clone(),
            notification_type: notification.notification_type,
            title: notification.title.clone(),
            body: notification.body.clone(),
            style: style_for(notification.notification_type),
            created_at: notification.created_at,
            expires_at: now + self.ttl,
        };
        self.visible.push_back(toast.clone());
        (toast, evicted)
    }

    /// Removes a toast on explicit user action.
    pub fn dismiss(&mut self, id: Uuid) -> Option<Toast> {
        let index = self.visible.iter().position(|t| t.id == id)?;
        self.visible.remove(index)
    }

    /// Removes and returns every toast whose time is up.
    pub fn expire(&mut self, now: Instant) -> Vec<Toast> {
        let mut expired = Vec::new();
        self.visible.retain(|t| {
            if t.expires_at <= now {
                expired.push(t.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn next_expiry(&self) -> Option<Instant> {
        self.visible.iter().map(|t| t.expires_at).min()
    }

    pub fn visible(&self) -> Vec<Toast> {
        self.visible.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn clear(&mut self) {
        self.visible.clear();
    }
}
