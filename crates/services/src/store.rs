use std::collections::HashMap;

use bazaar_db::models::{Notification, NotificationId};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// Filled from the durable cache at startup.
    Hydrated,
    /// An inbound batch was reconciled. `newly_unread` is the only set that
    /// may trigger toasts or sounds.
    Merged { newly_unread: Vec<Notification> },
    /// An older page was loaded on request; never toast-eligible.
    PageLoaded { count: usize },
    Read(NotificationId),
    AllRead,
    Deleted(NotificationId),
    Cleared,
}

/// Emitted after every committed mutation, carrying the recomputed count.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub kind: ChangeKind,
    pub unread_count: usize,
}

/// Read-only copy of the store, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

struct Entry {
    notification: Notification,
    touched: u64,
}

/// Canonical, deduplicated inbox keyed by notification id.
///
/// The unread count is never stored; it is derived from the mapping whenever
/// it is asked for, so it cannot drift.
pub struct NotificationStore {
    entries: HashMap<NotificationId, Entry>,
    next_touch: u64,
    changes: broadcast::Sender<StoreChange>,
}

impl NotificationStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: HashMap::new(),
            next_touch: 0,
            changes,
        }
    }

    pub fn on_change(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &NotificationId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &NotificationId) -> Option<&Notification> {
        self.entries.get(id).map(|e| &e.notification)
    }

    pub fn unread_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.notification.is_unread())
            .count()
    }

    /// Inserts or replaces a record without emitting. Callers batch several
    /// upserts and then [`commit`](Self::commit) once.
    pub fn upsert(&mut self, notification: Notification) -> Option<Notification> {
        let touched = self.touch();
        self.entries
            .insert(
                notification.id.clone(),
                Entry {
                    notification,
                    touched,
                },
            )
            .map(|e| e.notification)
    }

    /// Publishes a change event with the freshly derived unread count.
    pub fn commit(&self, kind: ChangeKind) -> StoreChange {
        let change = StoreChange {
            kind,
            unread_count: self.unread_count(),
        };
        // No subscribers is fine.
        let _ = self.changes.send(change.clone());
        change
    }

    /// Replaces the contents with a cached inbox.
    pub fn hydrate(&mut self, notifications: Vec<Notification>) -> StoreChange {
        self.entries.clear();
        // Oldest first so the touch order mirrors the cached order.
        for notification in notifications.into_iter().rev() {
            self.upsert(notification);
        }
        self.commit(ChangeKind::Hydrated)
    }

    /// Applies a server-confirmed read. An entry that is already read keeps
    /// its original timestamp. Returns `None` if the id is unknown.
    pub fn mark_read(&mut self, id: &NotificationId, at: DateTime<Utc>) -> Option<StoreChange> {
        let touched = self.touch();
        let entry = self.entries.get_mut(id)?;
        entry.notification.read_at.get_or_insert(at);
        entry.touched = touched;
        Some(self.commit(ChangeKind::Read(id.clone())))
    }

    /// Applies a server-confirmed "read all".
    pub fn mark_all_read(&mut self, at: DateTime<Utc>) -> StoreChange {
        for entry in self.entries.values_mut() {
            entry.notification.read_at.get_or_insert(at);
        }
        self.commit(ChangeKind::AllRead)
    }

    /// Applies a server-confirmed delete.
    pub fn delete(&mut self, id: &NotificationId) -> Option<StoreChange> {
        self.entries.remove(id)?;
        Some(self.commit(ChangeKind::Deleted(id.clone())))
    }

    pub fn clear(&mut self) -> StoreChange {
        self.entries.clear();
        self.commit(ChangeKind::Cleared)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let mut notifications: Vec<Notification> = self
            .entries
            .values()
            .map(|e| e.notification.clone())
            .collect();
        notifications.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        StoreSnapshot {
            unread_count: notifications.iter().filter(|n| n.is_unread()).count(),
            notifications,
        }
    }

    /// The `limit` most recently touched records, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by(|a, b| b.touched.cmp(&a.touched));
        entries
            .into_iter()
            .take(limit)
            .map(|e| e.notification.clone())
            .collect()
    }

    fn touch(&mut self) -> u64 {
        self.next_touch += 1;
        self.next_touch
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}
