use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{AuthUser, EngineDeps, SyncEngine};

/// Signals from whatever owns authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSignal {
    LoggedIn(AuthUser),
    LoggedOut,
}

/// Owns the engine for the current session. At most one engine runs at a
/// time; it is built on login and torn down on logout.
pub struct LifecycleBinder {
    deps: EngineDeps,
    engine: Option<SyncEngine>,
}

impl LifecycleBinder {
    pub fn new(deps: EngineDeps) -> Self {
        Self { deps, engine: None }
    }

    pub fn engine(&self) -> Option<&SyncEngine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut SyncEngine> {
        self.engine.as_mut()
    }

    /// Starts an engine for `user`. A repeated login while one is already
    /// running is a no-op. An engine that stopped on its own (rejected
    /// credentials) is replaced; its cache is kept for the same user.
    pub async fn logged_in(&mut self, user: AuthUser) -> &SyncEngine {
        if let Some(stale) = self.engine.take_if(|engine| !engine.is_running()) {
            info!(user_id = stale.user_id(), "Replacing stopped notification sync");
            if stale.user_id() != user.id {
                stale.clear();
                if let Err(e) = stale.purge_cache() {
                    warn!(%e, "Failed to purge notification cache");
                }
            }
            stale.shutdown().await;
        }

        match &self.engine {
            Some(engine) if engine.user_id() != user.id => warn!(
                current = engine.user_id(),
                requested = %user.id,
                "Login for a different user while a session is active, ignoring"
            ),
            Some(_) => debug!(user_id = %user.id, "Notification sync already running"),
            None => info!(user_id = %user.id, "Starting notification sync"),
        }

        let deps = &self.deps;
        self.engine.get_or_insert_with(|| SyncEngine::start(deps, &user))
    }

    /// Stops syncing, empties the store and forgets the cached inbox.
    pub async fn logged_out(&mut self) {
        let Some(mut engine) = self.engine.take() else {
            return;
        };

        engine.stop().await;
        engine.clear();
        if let Err(e) = engine.purge_cache() {
            warn!(%e, "Failed to purge notification cache");
        }
        info!(user_id = engine.user_id(), "Notification sync stopped after logout");
        engine.shutdown().await;
    }

    /// Stops syncing but keeps the cached inbox for the next start.
    pub async fn shutdown(&mut self) {
        if let Some(engine) = self.engine.take() {
            info!(user_id = engine.user_id(), "Shutting down notification sync");
            engine.shutdown().await;
        }
    }

    pub async fn handle(&mut self, signal: AuthSignal) {
        match signal {
            AuthSignal::LoggedIn(user) => {
                self.logged_in(user).await;
            }
            AuthSignal::LoggedOut => self.logged_out().await,
        }
    }

    /// Applies signals in order until the sender goes away, then shuts down
    /// without purging.
    pub async fn run(mut self, mut signals: mpsc::Receiver<AuthSignal>) {
        while let Some(signal) = signals.recv().await {
            self.handle(signal).await;
        }
        self.shutdown().await;
    }
}
