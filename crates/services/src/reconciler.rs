//! Folds inbound batches from either transport into the store.
//!
//! Server content always wins, with one exception: a record the store already
//! holds as read is never regressed to unread by a late snapshot that
//! predates the read.

use bazaar_db::models::Notification;

use crate::store::{ChangeKind, NotificationStore, StoreChange};

/// Result of merging one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Unread records that the store did not hold before this batch.
    pub newly_unread: Vec<Notification>,
    pub change: StoreChange,
}

/// Upserts every record of `incoming` and returns the newly-unread subset,
/// in batch order. Does not emit; see [`merge`].
pub fn reconcile(store: &mut NotificationStore, incoming: Vec<Notification>) -> Vec<Notification> {
    let mut newly_unread = Vec::new();

    for mut notification in incoming {
        match store.get(&notification.id) {
            Some(existing) => {
                if notification.read_at.is_none() && existing.read_at.is_some() {
                    notification.read_at = existing.read_at;
                }
            }
            None if notification.is_unread() => newly_unread.push(notification.clone()),
            None => {}
        }
        store.upsert(notification);
    }

    newly_unread
}

/// Reconciles a batch and publishes a single `Merged` change for it.
pub fn merge(store: &mut NotificationStore, incoming: Vec<Notification>) -> MergeOutcome {
    let newly_unread = reconcile(store, incoming);
    let change = store.commit(ChangeKind::Merged {
        newly_unread: newly_unread.clone(),
    });
    MergeOutcome {
        newly_unread,
        change,
    }
}

/// Reconciles an explicitly requested older page. Nothing in it is
/// toast-eligible.
pub fn merge_page(store: &mut NotificationStore, incoming: Vec<Notification>) -> StoreChange {
    let count = incoming.len();
    reconcile(store, incoming);
    store.commit(ChangeKind::PageLoaded { count })
}
