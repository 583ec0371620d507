use std::sync::Arc;

use bazaar_db::MemoryCache;
use bazaar_db::models::NotificationId;
use bazaar_services::{ConnectionPhase, PresentationEvent, SyncEngine};

use crate::fixtures::mock_backend::MockBackend;
use crate::fixtures::seed::{aged, unread};
use crate::fixtures::wait_until;

#[tokio::test]
async fn initial_pull_fills_store_and_raises_toasts() {
    let backend = MockBackend::spawn().await;
    backend.seed_unread(&["a", "b", "c"]);

    let engine = SyncEngine::start(&backend.deps(Arc::new(MemoryCache::new())), &backend.user());
    wait_until("three unread", || engine.unread_count() == 3).await;
    wait_until("three toasts", || engine.presenter().visible_toasts().len() == 3).await;

    assert_eq!(engine.presenter().badge_text().as_deref(), Some("3"));
    let first = &backend.fetches()[0];
    assert_eq!(first.page, Some(1));
    assert_eq!(first.size, Some(20));
    assert!(first.since.is_none());
    engine.shutdown().await;
}

#[tokio::test]
async fn polling_takes_over_when_push_is_unavailable() {
    let backend = MockBackend::spawn().await;
    backend.set_push_enabled(false);

    let engine = SyncEngine::start(&backend.deps(Arc::new(MemoryCache::new())), &backend.user());
    wait_until("polling fallback", || {
        engine.connection_state().phase == ConnectionPhase::PollingFallback
    })
    .await;
    assert_eq!(engine.connection_state().retry_count, 3);

    backend.insert(unread("late"));
    wait_until("polled notification", || engine.get(&NotificationId::from("late")).is_some()).await;
    wait_until("toast for polled notification", || engine.presenter().visible_toasts().len() == 1).await;

    assert_eq!(backend.ws_connects(), 0);
    // Every pull after the first carries the cursor.
    assert!(backend.fetches()[1..].iter().all(|f| f.since.is_some()));
    engine.shutdown().await;
}

#[tokio::test]
async fn repeated_polls_do_not_replay_toasts() {
    let backend = MockBackend::spawn().await;
    backend.set_push_enabled(false);
    backend.seed_unread(&["a", "b"]);

    let engine = SyncEngine::start(&backend.deps(Arc::new(MemoryCache::new())), &backend.user());
    wait_until("two toasts", || engine.presenter().visible_toasts().len() == 2).await;
    let mut presented = engine.presenter().subscribe();

    wait_until("a few polls", || backend.fetch_count() >= 4).await;
    let mut shown = 0;
    while let Ok(event) = presented.try_recv() {
        if let PresentationEvent::ToastShown(_) = event {
            shown += 1;
        }
    }
    assert_eq!(shown, 0);
    assert_eq!(engine.unread_count(), 2);
    engine.shutdown().await;
}

#[tokio::test]
async fn older_pages_load_without_toasts() {
    let backend = MockBackend::spawn().await;
    for i in 0..25 {
        backend.insert(aged(&format!("n{i:02}"), 100 + i));
    }

    let engine = SyncEngine::start(&backend.deps(Arc::new(MemoryCache::new())), &backend.user());
    wait_until("first page", || engine.unread_count() == 20).await;
    // The newest twenty arrive first; the toast queue keeps only five.
    assert!(engine.get(&NotificationId::from("n00")).is_some());
    assert!(engine.get(&NotificationId::from("n24")).is_none());
    wait_until("badge for first page", || engine.presenter().unread_count() == 20).await;

    let mut presented = engine.presenter().subscribe();
    assert_eq!(engine.load_page(2).await.unwrap(), 5);
    assert_eq!(engine.unread_count(), 25);
    assert!(engine.get(&NotificationId::from("n24")).is_some());

    wait_until("badge for second page", || engine.presenter().unread_count() == 25).await;
    while let Ok(event) = presented.try_recv() {
        assert!(!matches!(event, PresentationEvent::ToastShown(_)));
    }

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.notifications.first().unwrap().id.as_str(), "n00");
    assert_eq!(snapshot.notifications.last().unwrap().id.as_str(), "n24");
    engine.shutdown().await;
}

#[tokio::test]
async fn unauthorized_backend_closes_the_session() {
    let backend = MockBackend::spawn().await;
    backend.set_unauthorized(true);

    let engine = SyncEngine::start(&backend.deps(Arc::new(MemoryCache::new())), &backend.user());
    wait_until("closed", || engine.connection_state().phase == ConnectionPhase::Closed).await;
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;

    assert!(!engine.is_running());
    assert_eq!(backend.ws_connects(), 0);
    assert_eq!(engine.connection_state().phase, ConnectionPhase::Closed);
    engine.shutdown().await;
}

#[tokio::test]
async fn credentials_revoked_while_polling_are_terminal() {
    let backend = MockBackend::spawn().await;
    backend.set_push_enabled(false);

    let engine = SyncEngine::start(&backend.deps(Arc::new(MemoryCache::new())), &backend.user());
    wait_until("polling fallback", || {
        engine.connection_state().phase == ConnectionPhase::PollingFallback
    })
    .await;

    backend.set_unauthorized(true);
    wait_until("closed", || engine.connection_state().phase == ConnectionPhase::Closed).await;

    backend.set_unauthorized(false);
    backend.insert(unread("after"));
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    assert!(engine.get(&NotificationId::from("after")).is_none());
    engine.shutdown().await;
}
