use std::sync::Arc;

use bazaar_db::MemoryCache;
use bazaar_db::models::NotificationId;
use bazaar_services::{ConnectionPhase, SyncEngine, SyncError};
use tokio_test::{assert_err, assert_ok};

use crate::fixtures::mock_backend::{MockBackend, MutationMode};
use crate::fixtures::seed::unread;
use crate::fixtures::wait_until;

async fn engine_with(backend: &MockBackend, ids: &[&str]) -> SyncEngine {
    backend.seed_unread(ids);
    let engine = SyncEngine::start(&backend.deps(Arc::new(MemoryCache::new())), &backend.user());
    wait_until("seeded inbox", || engine.unread_count() == ids.len()).await;
    engine
}

#[tokio::test]
async fn mark_read_applies_after_server_confirms() {
    let backend = MockBackend::spawn().await;
    let engine = engine_with(&backend, &["a", "b", "c"]).await;
    let id = NotificationId::from("b");

    assert_ok!(engine.mark_read(&id).await);

    assert_eq!(engine.unread_count(), 2);
    assert!(engine.get(&id).unwrap().read_at.is_some());
    assert!(backend.get("b").unwrap().read_at.is_some());
    wait_until("badge follows", || engine.presenter().badge_text().as_deref() == Some("2")).await;
    engine.shutdown().await;
}

#[tokio::test]
async fn stale_poll_cannot_undo_a_confirmed_read() {
    let backend = MockBackend::spawn().await;
    backend.set_push_enabled(false);
    let engine = engine_with(&backend, &["a", "b", "c"]).await;
    wait_until("polling fallback", || {
        engine.connection_state().phase == ConnectionPhase::PollingFallback
    })
    .await;

    let id = NotificationId::from("b");
    assert_ok!(engine.mark_read(&id).await);
    let read_at = engine.get(&id).unwrap().read_at;

    // The server hands back an unread copy of the same record.
    backend.insert(unread("b"));
    let fetches = backend.fetch_count();
    wait_until("two more polls", || backend.fetch_count() >= fetches + 2).await;

    assert_eq!(engine.unread_count(), 2);
    assert_eq!(engine.get(&id).unwrap().read_at, read_at);
    engine.shutdown().await;
}

#[tokio::test]
async fn failed_or_rejected_actions_leave_store_untouched() {
    let backend = MockBackend::spawn().await;
    let engine = engine_with(&backend, &["a", "b"]).await;
    let before = engine.snapshot();
    let a = NotificationId::from("a");

    backend.set_mutation_mode(MutationMode::Fail);
    let err = assert_err!(engine.mark_read(&a).await);
    assert!(matches!(err, SyncError::Status(500)));
    assert_err!(engine.delete(&a).await);
    assert_err!(engine.mark_all_read().await);
    assert_eq!(engine.snapshot(), before);

    backend.set_mutation_mode(MutationMode::Reject);
    let err = assert_err!(engine.mark_read(&a).await);
    assert!(matches!(err, SyncError::Rejected));
    assert_eq!(engine.snapshot(), before);

    assert!(backend.get("a").unwrap().read_at.is_none());
    assert_eq!(backend.len(), 2);
    engine.shutdown().await;
}

#[tokio::test]
async fn unknown_id_is_reported_without_a_request() {
    let backend = MockBackend::spawn().await;
    let engine = engine_with(&backend, &["a"]).await;

    let err = assert_err!(engine.delete(&NotificationId::from("ghost")).await);
    assert!(matches!(err, SyncError::NotFound(id) if id.as_str() == "ghost"));
    assert_eq!(engine.snapshot().notifications.len(), 1);
    engine.shutdown().await;
}

#[tokio::test]
async fn delete_and_read_all_round_trip() {
    let backend = MockBackend::spawn().await;
    let engine = engine_with(&backend, &["a", "b", "order/42 #1"]).await;

    // Ids are path-encoded on the way out.
    assert_ok!(engine.delete(&NotificationId::from("order/42 #1")).await);
    assert!(backend.get("order/42 #1").is_none());
    assert_eq!(engine.snapshot().notifications.len(), 2);

    assert_ok!(engine.mark_all_read().await);
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.unread_count, 0);
    assert!(snapshot.notifications.iter().all(|n| n.read_at.is_some()));
    assert!(backend.get("a").unwrap().read_at.is_some());
    wait_until("badge hidden", || engine.presenter().badge_text().is_none()).await;
    engine.shutdown().await;
}

#[tokio::test]
async fn expired_session_rejects_actions() {
    let backend = MockBackend::spawn().await;
    let engine = engine_with(&backend, &["a"]).await;

    backend.set_unauthorized(true);
    let err = assert_err!(engine.mark_read(&NotificationId::from("a")).await);
    assert!(err.is_auth());
    assert_eq!(engine.unread_count(), 1);
    engine.shutdown().await;
}
