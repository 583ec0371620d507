use std::sync::Arc;
use std::time::Duration;

use bazaar_db::MemoryCache;
use bazaar_db::models::{NotificationId, NotificationType};
use bazaar_services::{ConnectionPhase, SyncEngine};

use crate::fixtures::mock_backend::MockBackend;
use crate::fixtures::seed::{notification, unread};
use crate::fixtures::wait_until;

async fn open_engine(backend: &MockBackend) -> SyncEngine {
    let engine = SyncEngine::start(&backend.deps(Arc::new(MemoryCache::new())), &backend.user());
    wait_until("push channel open", || engine.connection_state().phase == ConnectionPhase::Open).await;
    engine
}

#[tokio::test]
async fn pushed_notification_arrives_without_polling() {
    let backend = MockBackend::spawn().await;
    let engine = open_engine(&backend).await;
    let fetches = backend.fetch_count();

    backend.push(notification("trade-1", NotificationType::TradeOffer));
    wait_until("pushed notification", || {
        engine.get(&NotificationId::from("trade-1")).is_some()
    })
    .await;
    wait_until("toast", || engine.presenter().visible_toasts().len() == 1).await;

    let toast = &engine.presenter().visible_toasts()[0];
    assert_eq!(toast.notification_type, NotificationType::TradeOffer);
    assert_eq!(toast.style.icon, "swap");
    assert_eq!(backend.fetch_count(), fetches);
    engine.shutdown().await;
}

#[tokio::test]
async fn malformed_frames_are_dropped_and_channel_stays_open() {
    let backend = MockBackend::spawn().await;
    let engine = open_engine(&backend).await;

    backend.push_raw("{not json");
    backend.push_raw(r#"{"type":"notification","data":{"id":1}}"#);
    backend.push_raw(r#"{"type":"pong"}"#);
    backend.push_raw(r#"{"type":"typing","data":{}}"#);
    backend.push(unread("after-garbage"));

    wait_until("valid frame after garbage", || {
        engine.get(&NotificationId::from("after-garbage")).is_some()
    })
    .await;
    assert_eq!(engine.snapshot().notifications.len(), 1);
    assert_eq!(engine.connection_state().phase, ConnectionPhase::Open);
    assert_eq!(backend.ws_connects(), 1);
    engine.shutdown().await;
}

#[tokio::test]
async fn numeric_ids_from_the_wire_are_accepted() {
    let backend = MockBackend::spawn().await;
    let engine = open_engine(&backend).await;

    backend.push_raw(
        serde_json::json!({
            "type": "notification",
            "data": {
                "id": 4242,
                "type": "order_update",
                "title": "Order shipped",
                "created_at": "2026-04-01T09:00:00Z",
            }
        })
        .to_string(),
    );

    wait_until("numeric id", || engine.get(&NotificationId::from("4242")).is_some()).await;
    let stored = engine.get(&NotificationId::from("4242")).unwrap();
    assert_eq!(stored.notification_type, NotificationType::OrderUpdate);
    assert!(stored.data.is_null());
    engine.shutdown().await;
}

#[tokio::test]
async fn server_close_reconnects_with_base_delay() {
    let backend = MockBackend::spawn().await;
    let engine = open_engine(&backend).await;
    let mut states = engine.events();

    backend.close_push_connections();
    wait_until("second connection", || backend.ws_connects() == 2).await;
    wait_until("open again", || engine.connection_state().phase == ConnectionPhase::Open).await;

    let mut seen = Vec::new();
    while let Ok(state) = states.try_recv() {
        seen.push(state);
    }
    let reconnecting = seen
        .iter()
        .find(|s| s.phase == ConnectionPhase::Reconnecting)
        .expect("a reconnecting transition");
    assert_eq!(reconnecting.retry_count, 1);
    assert_eq!(reconnecting.reconnect_delay, Some(Duration::from_millis(50)));
    assert_eq!(engine.connection_state().retry_count, 0);

    backend.push(unread("after-reconnect"));
    wait_until("delivery on the new channel", || {
        engine.get(&NotificationId::from("after-reconnect")).is_some()
    })
    .await;
    engine.shutdown().await;
}

#[tokio::test]
async fn exhausted_reconnects_fall_back_to_polling_for_good() {
    let backend = MockBackend::spawn().await;
    let engine = open_engine(&backend).await;

    backend.set_push_enabled(false);
    backend.close_push_connections();
    wait_until("polling fallback", || {
        engine.connection_state().phase == ConnectionPhase::PollingFallback
    })
    .await;

    // Push comes back, but the session stays on polling.
    backend.set_push_enabled(true);
    backend.insert(unread("polled"));
    wait_until("polled notification", || {
        engine.get(&NotificationId::from("polled")).is_some()
    })
    .await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(backend.ws_connects(), 1);
    assert_eq!(engine.connection_state().phase, ConnectionPhase::PollingFallback);
    engine.shutdown().await;
}

#[tokio::test]
async fn stop_closes_an_open_channel() {
    let backend = MockBackend::spawn().await;
    let mut engine = open_engine(&backend).await;

    engine.stop().await;
    assert_eq!(engine.connection_state().phase, ConnectionPhase::Closed);

    backend.push(unread("too-late"));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(engine.get(&NotificationId::from("too-late")).is_none());
    engine.shutdown().await;
}
