use std::sync::Arc;

use bazaar_config::Settings;
use bazaar_db::models::{Notification, NotificationId};
use bazaar_db::{CachedInbox, DurableCache, open_cache};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{FetchQuery, HttpNotificationApi, NotificationApi};
use crate::connection::{ConnectionEvent, ConnectionManager, ConnectionState, PageEvent};
use crate::error::{SyncError, SyncResult};
use crate::presentation::{Presenter, SoundSink};
use crate::push::{PushConnector, WsPushConnector};
use crate::reconciler;
use crate::store::{NotificationStore, StoreChange, StoreSnapshot};

const STATE_CHANNEL_CAPACITY: usize = 64;

/// Everything a [`SyncEngine`] is built from. Cheap to clone; the lifecycle
/// binder keeps one and starts a fresh engine from it on every login.
#[derive(Clone)]
pub struct EngineDeps {
    pub settings: Settings,
    pub api: Arc<dyn NotificationApi>,
    pub push: Arc<dyn PushConnector>,
    pub cache: Arc<dyn DurableCache>,
    pub sounds: Arc<dyn SoundSink>,
}

impl EngineDeps {
    /// HTTP + WebSocket transports and the configured cache backend.
    pub fn from_settings(settings: Settings, sounds: Arc<dyn SoundSink>) -> SyncResult<Self> {
        let api = Arc::new(HttpNotificationApi::new(&settings.api)?);
        let push = Arc::new(WsPushConnector::new(settings.api.ws_url.clone()));
        let cache = open_cache(&settings)?;
        Ok(Self {
            settings,
            api,
            push,
            cache,
            sounds,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub token: String,
}

struct Shared {
    store: Mutex<NotificationStore>,
    last_check: Mutex<Option<DateTime<Utc>>>,
    connection: Mutex<ConnectionState>,
    connection_tx: broadcast::Sender<ConnectionState>,
    cache: Arc<dyn DurableCache>,
    cache_key: String,
    max_entries: usize,
}

impl Shared {
    /// Rewrites the cached record from the current store contents. Called
    /// with the store lock held so writes land in mutation order.
    fn persist(&self, store: &NotificationStore) {
        let inbox = CachedInbox {
            notifications: store.recent(self.max_entries),
            unread_count: store.unread_count(),
            last_successful_check: *self.last_check.lock(),
        };
        if let Err(e) = self.cache.save(&self.cache_key, &inbox) {
            warn!(%e, "Failed to persist notification cache");
        }
    }

    fn handle(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Batch(batch) => {
                let mut store = self.store.lock();
                let outcome = reconciler::merge(&mut store, batch);
                debug!(
                    newly_unread = outcome.newly_unread.len(),
                    unread_count = outcome.change.unread_count,
                    "Batch merged"
                );
                self.persist(&store);
            }
            ConnectionEvent::Checked(at) => {
                *self.last_check.lock() = Some(at);
                let store = self.store.lock();
                self.persist(&store);
            }
            ConnectionEvent::StateChanged(state) => {
                *self.connection.lock() = state.clone();
                let _ = self.connection_tx.send(state);
            }
        }
    }
}

/// One signed-in session: store, transports and presentation wired
/// together. Built by [`SyncEngine::start`], torn down with
/// [`stop`](Self::stop) or [`shutdown`](Self::shutdown).
pub struct SyncEngine {
    user_id: String,
    token: String,
    api: Arc<dyn NotificationApi>,
    page_size: u32,
    shared: Arc<Shared>,
    presenter: Arc<Presenter>,
    manager: Option<ConnectionManager>,
    processor: Option<JoinHandle<()>>,
    presenter_task: Option<JoinHandle<()>>,
}

impl SyncEngine {
    /// Hydrates from the durable cache, then starts the transports.
    pub fn start(deps: &EngineDeps, user: &AuthUser) -> Self {
        let settings = &deps.settings;
        let cache_key = settings.cache.key.clone();

        // Read exactly once, before any network call.
        let cached = match deps.cache.load(&cache_key) {
            Ok(cached) => cached.unwrap_or_default(),
            Err(e) => {
                warn!(%e, "Ignoring unreadable notification cache");
                CachedInbox::default()
            }
        };
        let since = cached.last_successful_check;

        let store = NotificationStore::new();
        let presenter = Arc::new(Presenter::new(&settings.presentation, Arc::clone(&deps.sounds)));
        let presenter_task = tokio::spawn(Arc::clone(&presenter).run(store.on_change()));

        let (connection_tx, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            store: Mutex::new(store),
            last_check: Mutex::new(since),
            connection: Mutex::new(ConnectionState::idle(since)),
            connection_tx,
            cache: Arc::clone(&deps.cache),
            cache_key,
            max_entries: settings.cache.max_entries,
        });

        let hydrated = shared.store.lock().hydrate(cached.notifications);
        info!(
            user_id = %user.id,
            cached = shared.store.lock().len(),
            unread_count = hydrated.unread_count,
            "Notification store hydrated"
        );

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let processor = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move {
                while let Some(event) = events_rx.recv().await {
                    shared.handle(event);
                }
            })
        };

        let mut manager = ConnectionManager::new(
            Arc::clone(&deps.api),
            Arc::clone(&deps.push),
            &settings.sync,
            events_tx,
        );
        manager.start(user.token.clone(), since);

        Self {
            user_id: user.id.clone(),
            token: user.token.clone(),
            api: Arc::clone(&deps.api),
            page_size: settings.sync.page_size,
            shared,
            presenter,
            manager: Some(manager),
            processor: Some(processor),
            presenter_task: Some(presenter_task),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_running(&self) -> bool {
        self.manager.as_ref().is_some_and(|m| m.is_running())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.shared.store.lock().snapshot()
    }

    pub fn get(&self, id: &NotificationId) -> Option<Notification> {
        self.shared.store.lock().get(id).cloned()
    }

    pub fn unread_count(&self) -> usize {
        self.shared.store.lock().unread_count()
    }

    /// Store change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.shared.store.lock().on_change()
    }

    /// Connection state transitions.
    pub fn events(&self) -> broadcast::Receiver<ConnectionState> {
        self.shared.connection_tx.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.connection.lock().clone()
    }

    pub fn presenter(&self) -> &Arc<Presenter> {
        &self.presenter
    }

    pub fn page_event(&self, event: PageEvent) {
        if let Some(manager) = &self.manager {
            manager.page_event(event);
        }
    }

    /// Marks one notification read once the server confirms it.
    pub async fn mark_read(&self, id: &NotificationId) -> SyncResult<()> {
        self.ensure_known(id)?;
        self.api.mark_read(&self.token, id).await?;

        let mut store = self.shared.store.lock();
        if store.mark_read(id, Utc::now()).is_some() {
            self.shared.persist(&store);
        }
        Ok(())
    }

    pub async fn mark_all_read(&self) -> SyncResult<()> {
        self.api.mark_all_read(&self.token).await?;

        let mut store = self.shared.store.lock();
        store.mark_all_read(Utc::now());
        self.shared.persist(&store);
        Ok(())
    }

    pub async fn delete(&self, id: &NotificationId) -> SyncResult<()> {
        self.ensure_known(id)?;
        self.api.delete(&self.token, id).await?;

        let mut store = self.shared.store.lock();
        if store.delete(id).is_some() {
            self.shared.persist(&store);
        }
        Ok(())
    }

    /// Fetches an older page on request. Its records never raise toasts.
    /// Returns how many records the page held.
    pub async fn load_page(&self, page: u32) -> SyncResult<usize> {
        let query = FetchQuery {
            page,
            size: self.page_size,
            since: None,
        };
        let page = self.api.fetch(&self.token, &query).await?;
        let count = page.notifications.len();

        let mut store = self.shared.store.lock();
        reconciler::merge_page(&mut store, page.notifications);
        self.shared.persist(&store);
        Ok(count)
    }

    /// Stops the transports and drains any events they already produced.
    /// The store and its contents are left alone.
    pub async fn stop(&mut self) {
        if let Some(mut manager) = self.manager.take() {
            manager.stop().await;
        }
        // The manager owned the only sender, so the processor ends once it
        // has applied what was queued.
        if let Some(processor) = self.processor.take() {
            let _ = processor.await;
        }
    }

    /// Empties the store without touching the durable cache.
    pub fn clear(&self) {
        self.shared.store.lock().clear();
    }

    pub fn purge_cache(&self) -> SyncResult<()> {
        self.shared.cache.purge(&self.shared.cache_key)?;
        Ok(())
    }

    /// Stops everything and waits for the presenter to render the final
    /// store changes.
    pub async fn shutdown(mut self) {
        self.stop().await;
        let presenter_task = self.presenter_task.take();
        drop(self);
        if let Some(task) = presenter_task {
            let _ = task.await;
        }
    }

    fn ensure_known(&self, id: &NotificationId) -> SyncResult<()> {
        if self.shared.store.lock().contains(id) {
            Ok(())
        } else {
            Err(SyncError::NotFound(id.clone()))
        }
    }
}
