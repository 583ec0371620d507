use std::sync::Arc;
use std::time::Duration;

use bazaar_config::SyncSettings;
use bazaar_db::models::{Notification, PushEnvelope};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use super::backoff::ReconnectPolicy;
use super::state::{ConnectionPhase, ConnectionState, PageEvent};
use crate::api::{FetchQuery, NotificationApi};
use crate::push::{PushConnector, PushStream};

/// Output of the connection manager, delivered in order on a single channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A pull succeeded; the cursor advanced to this instant.
    Checked(DateTime<Utc>),
    Batch(Vec<Notification>),
    StateChanged(ConnectionState),
}

/// Owns the transport lifecycle: push channel first, linear-backoff
/// reconnects, then permanent polling once retries are exhausted.
///
/// All transport work runs on one spawned task; `stop` aborts it, which
/// drops every pending timer and in-flight request with it.
pub struct ConnectionManager {
    api: Arc<dyn NotificationApi>,
    push: Arc<dyn PushConnector>,
    policy: ReconnectPolicy,
    poll_interval: Duration,
    page_size: u32,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    state: Arc<Mutex<ConnectionState>>,
    page_tx: Option<mpsc::UnboundedSender<PageEvent>>,
    handle: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        push: Arc<dyn PushConnector>,
        settings: &SyncSettings,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Self {
        Self {
            api,
            push,
            policy: ReconnectPolicy::from(settings),
            poll_interval: settings.poll_interval(),
            page_size: settings.page_size,
            events,
            state: Arc::new(Mutex::new(ConnectionState::default())),
            page_tx: None,
            handle: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Starts syncing with `token`. `since` seeds the pull cursor (usually the
    /// cached last successful check). A second call while running is ignored.
    pub fn start(&mut self, token: String, since: Option<DateTime<Utc>>) {
        if self.is_running() {
            warn!("Connection manager already running, ignoring start");
            return;
        }

        let (page_tx, page_rx) = mpsc::unbounded_channel();
        let initial = ConnectionState::idle(since);
        *self.state.lock() = initial.clone();

        let runner = Runner {
            api: Arc::clone(&self.api),
            push: Arc::clone(&self.push),
            policy: self.policy,
            poll_interval: self.poll_interval,
            page_size: self.page_size,
            token,
            state: initial,
            shared: Arc::clone(&self.state),
            events: self.events.clone(),
            page_rx,
            visible: true,
        };

        self.page_tx = Some(page_tx);
        self.handle = Some(tokio::spawn(runner.run()));
    }

    /// Forwards a visibility/focus change to the running task.
    pub fn page_event(&self, event: PageEvent) {
        if let Some(tx) = &self.page_tx {
            let _ = tx.send(event);
        }
    }

    /// Cancels every timer and in-flight request and moves to `Closed`.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.page_tx = None;

        let closed = {
            let mut state = self.state.lock();
            if state.phase == ConnectionPhase::Closed {
                return;
            }
            state.phase = ConnectionPhase::Closed;
            state.reconnect_delay = None;
            state.clone()
        };
        info!("Connection manager stopped");
        let _ = self.events.send(ConnectionEvent::StateChanged(closed));
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PullOutcome {
    Fetched,
    Failed,
    Unauthorized,
}

/// Whether the runner should keep going after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Terminate,
}

struct Runner {
    api: Arc<dyn NotificationApi>,
    push: Arc<dyn PushConnector>,
    policy: ReconnectPolicy,
    poll_interval: Duration,
    page_size: u32,
    token: String,
    state: ConnectionState,
    shared: Arc<Mutex<ConnectionState>>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    page_rx: mpsc::UnboundedReceiver<PageEvent>,
    visible: bool,
}

impl Runner {
    async fn run(mut self) {
        self.transition(ConnectionPhase::Connecting, None);

        // Catch up on anything missed while offline before going live.
        if self.pull().await == PullOutcome::Unauthorized {
            self.close();
            return;
        }

        if self.run_push().await == Flow::Continue {
            self.run_polling().await;
        }
        debug!("Connection runner finished");
    }

    /// Push mode. Returns `Continue` once retries are exhausted and polling
    /// should take over, `Terminate` if the session ended.
    async fn run_push(&mut self) -> Flow {
        loop {
            self.transition(ConnectionPhase::Connecting, None);

            match self.push.connect(&self.token).await {
                Ok(stream) => {
                    self.state.retry_count = 0;
                    self.transition(ConnectionPhase::Open, None);
                    if self.read_push(stream).await == Flow::Terminate {
                        return Flow::Terminate;
                    }
                }
                Err(e) if e.is_auth() => {
                    warn!("Push channel rejected credentials");
                    self.close();
                    return Flow::Terminate;
                }
                Err(e) => {
                    warn!(%e, retry_count = self.state.retry_count, "Push channel connect failed");
                }
            }

            self.state.retry_count += 1;
            let retry_count = self.state.retry_count;
            if self.policy.exhausted(retry_count) {
                info!(retry_count, "Push retries exhausted, falling back to polling");
                return Flow::Continue;
            }

            let delay = self.policy.delay_for(retry_count);
            self.transition(ConnectionPhase::Reconnecting, Some(delay));
            if self.wait(delay).await == Flow::Terminate {
                return Flow::Terminate;
            }
        }
    }

    /// Reads an open channel until it drops. While the page is hidden the
    /// channel stays open but is not read.
    async fn read_push(&mut self, mut stream: PushStream) -> Flow {
        loop {
            tokio::select! {
                frame = stream.next(), if self.visible => match frame {
                    Some(Ok(text)) => self.handle_frame(&text),
                    Some(Err(e)) => {
                        warn!(%e, "Push channel dropped");
                        return Flow::Continue;
                    }
                    None => {
                        info!("Push channel closed by server");
                        return Flow::Continue;
                    }
                },
                event = self.page_rx.recv() => match event {
                    Some(event) => {
                        if self.on_page_event(event).await == Some(PullOutcome::Unauthorized) {
                            self.close();
                            return Flow::Terminate;
                        }
                    }
                    None => return Flow::Terminate,
                },
            }
        }
    }

    /// Polling mode, for the rest of the session. A failed pull re-arms the
    /// timer with the base delay instead of the poll interval.
    async fn run_polling(&mut self) {
        self.transition(ConnectionPhase::PollingFallback, None);
        let mut deadline = Instant::now() + self.poll_interval;

        loop {
            let outcome = tokio::select! {
                _ = sleep_until(deadline), if self.visible => Some(self.pull().await),
                event = self.page_rx.recv() => match event {
                    Some(event) => self.on_page_event(event).await,
                    None => return,
                },
            };

            match outcome {
                Some(PullOutcome::Fetched) => deadline = Instant::now() + self.poll_interval,
                Some(PullOutcome::Failed) => deadline = Instant::now() + self.policy.base_delay,
                Some(PullOutcome::Unauthorized) => {
                    self.close();
                    return;
                }
                None => {}
            }
        }
    }

    /// Sleeps for a reconnect delay while still serving page events. The
    /// timer is suspended while the page is hidden.
    async fn wait(&mut self, delay: Duration) -> Flow {
        let deadline = Instant::now() + delay;
        loop {
            tokio::select! {
                _ = sleep_until(deadline), if self.visible => return Flow::Continue,
                event = self.page_rx.recv() => match event {
                    Some(event) => {
                        if self.on_page_event(event).await == Some(PullOutcome::Unauthorized) {
                            self.close();
                            return Flow::Terminate;
                        }
                    }
                    None => return Flow::Terminate,
                },
            }
        }
    }

    /// Becoming visible (after being hidden) or regaining focus triggers one
    /// immediate pull. Returns its outcome, if one was made.
    async fn on_page_event(&mut self, event: PageEvent) -> Option<PullOutcome> {
        debug!(?event, "Page event");
        match event {
            PageEvent::Hidden => {
                self.visible = false;
                None
            }
            PageEvent::Blurred => None,
            PageEvent::Visible => {
                let was_hidden = !self.visible;
                self.visible = true;
                if was_hidden { Some(self.pull().await) } else { None }
            }
            PageEvent::Focused => Some(self.pull().await),
        }
    }

    async fn pull(&mut self) -> PullOutcome {
        let query = FetchQuery {
            page: 1,
            size: self.page_size,
            since: self.state.last_successful_check,
        };
        let started = Utc::now();

        match self.api.fetch(&self.token, &query).await {
            Ok(page) => {
                self.state.last_successful_check = Some(started);
                *self.shared.lock() = self.state.clone();
                let _ = self.events.send(ConnectionEvent::Checked(started));
                if !page.notifications.is_empty() {
                    let _ = self.events.send(ConnectionEvent::Batch(page.notifications));
                }
                PullOutcome::Fetched
            }
            Err(e) if e.is_auth() => {
                warn!("Notification pull rejected credentials");
                PullOutcome::Unauthorized
            }
            Err(e) => {
                warn!(%e, "Notification pull failed");
                PullOutcome::Failed
            }
        }
    }

    fn handle_frame(&mut self, text: &str) {
        match PushEnvelope::parse(text) {
            Some(PushEnvelope::Notification(notification)) => {
                debug!(notification_id = %notification.id, "Push notification received");
                let _ = self
                    .events
                    .send(ConnectionEvent::Batch(vec![notification]));
            }
            Some(PushEnvelope::Connected) => debug!("Push channel handshake received"),
            Some(PushEnvelope::Pong) => {}
            Some(PushEnvelope::Other(msg_type)) => debug!(%msg_type, "Ignoring push frame"),
            None => debug!("Dropping malformed push frame"),
        }
    }

    fn close(&mut self) {
        self.transition(ConnectionPhase::Closed, None);
    }

    fn transition(&mut self, phase: ConnectionPhase, reconnect_delay: Option<Duration>) {
        let previous = self.state.clone();
        self.state.phase = phase;
        self.state.reconnect_delay = reconnect_delay;
        *self.shared.lock() = self.state.clone();

        if previous.phase == phase
            && previous.reconnect_delay == reconnect_delay
            && previous.retry_count == self.state.retry_count
        {
            return;
        }

        info!(
            %phase,
            retry_count = self.state.retry_count,
            delay_ms = reconnect_delay.map(|d| d.as_millis() as u64),
            "Connection state changed"
        );
        let _ = self
            .events
            .send(ConnectionEvent::StateChanged(self.state.clone()));
    }
}
