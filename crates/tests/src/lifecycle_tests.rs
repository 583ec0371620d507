use std::sync::Arc;
use std::time::Duration;

use bazaar_db::FileCache;
use bazaar_db::models::NotificationId;
use bazaar_services::{AuthSignal, LifecycleBinder};
use tokio::sync::mpsc;

use crate::fixtures::mock_backend::MockBackend;
use crate::fixtures::seed::{read, unread};
use crate::fixtures::wait_until;

const CACHE_KEY: &str = "notifications";

#[tokio::test]
async fn restart_hydrates_from_file_cache_before_network() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::spawn().await;
    backend.insert(unread("a"));
    backend.insert(read("b"));

    let cache = Arc::new(FileCache::new(dir.path()));
    let mut binder = LifecycleBinder::new(backend.deps(cache.clone()));
    let engine = binder.logged_in(backend.user()).await;
    wait_until("first sync", || engine.snapshot().notifications.len() == 2).await;
    binder.shutdown().await;
    assert!(cache.path_for(CACHE_KEY).exists());

    // Second session: the backend refuses everything, yet the inbox is warm.
    backend.set_unauthorized(true);
    let mut binder = LifecycleBinder::new(backend.deps(cache.clone()));
    let engine = binder.logged_in(backend.user()).await;
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.notifications.len(), 2);
    assert_eq!(snapshot.unread_count, 1);
    assert!(engine.get(&NotificationId::from("b")).unwrap().read_at.is_some());
    binder.shutdown().await;
}

#[tokio::test]
async fn logout_stops_sync_and_purges_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::spawn().await;
    backend.seed_unread(&["a", "b"]);

    let cache = Arc::new(FileCache::new(dir.path()));
    let mut binder = LifecycleBinder::new(backend.deps(cache.clone()));
    let engine = binder.logged_in(backend.user()).await;
    wait_until("first sync", || engine.unread_count() == 2).await;
    assert!(cache.path_for(CACHE_KEY).exists());

    binder.logged_out().await;
    assert!(binder.engine().is_none());
    assert!(!cache.path_for(CACHE_KEY).exists());

    let fetches = backend.fetch_count();
    backend.insert(unread("c"));
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(backend.fetch_count(), fetches);
    assert!(!cache.path_for(CACHE_KEY).exists());
}

#[tokio::test]
async fn corrupt_cache_is_a_cold_start() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::spawn().await;
    backend.seed_unread(&["a"]);

    let cache = Arc::new(FileCache::new(dir.path()));
    std::fs::write(cache.path_for(CACHE_KEY), b"{ definitely not json").unwrap();

    let mut binder = LifecycleBinder::new(backend.deps(cache.clone()));
    let engine = binder.logged_in(backend.user()).await;
    assert!(engine.snapshot().notifications.is_empty());
    wait_until("first sync", || engine.unread_count() == 1).await;
    binder.shutdown().await;

    // The next write replaced the corrupt record.
    let raw = std::fs::read_to_string(cache.path_for(CACHE_KEY)).unwrap();
    let inbox: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(inbox["notifications"].as_array().unwrap().len(), 1);
    assert!(inbox["lastSuccessfulCheck"].is_string());
}

#[tokio::test]
async fn auth_signals_drive_the_binder() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::spawn().await;
    backend.seed_unread(&["a"]);

    let cache = Arc::new(FileCache::new(dir.path()));
    let binder = LifecycleBinder::new(backend.deps(cache.clone()));
    let (tx, rx) = mpsc::channel(4);
    let task = tokio::spawn(binder.run(rx));

    tx.send(AuthSignal::LoggedIn(backend.user())).await.unwrap();
    tx.send(AuthSignal::LoggedIn(backend.user())).await.unwrap();
    wait_until("cache written", || cache.path_for(CACHE_KEY).exists()).await;
    assert_eq!(backend.fetches().iter().filter(|f| f.since.is_none()).count(), 1);

    tx.send(AuthSignal::LoggedOut).await.unwrap();
    drop(tx);
    task.await.unwrap();
    assert!(!cache.path_for(CACHE_KEY).exists());
}

#[tokio::test]
async fn login_after_expired_session_resumes_sync() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::spawn().await;
    backend.seed_unread(&["a"]);
    backend.set_unauthorized(true);

    let cache = Arc::new(FileCache::new(dir.path()));
    let mut binder = LifecycleBinder::new(backend.deps(cache.clone()));
    binder.logged_in(backend.user()).await;
    wait_until("session rejected", || binder.engine().is_some_and(|e| !e.is_running())).await;

    backend.set_unauthorized(false);
    let engine = binder.logged_in(backend.user()).await;
    assert!(engine.is_running());
    wait_until("first sync", || engine.unread_count() == 1).await;
    wait_until("push channel", || backend.ws_connects() == 1).await;
    binder.shutdown().await;
}
