//! Turns store changes into badge, toast and sound output. Reads change
//! events only; never touches the store.

pub mod badge;
pub mod format;
pub mod sound;
pub mod style;
pub mod toast;

use std::sync::Arc;

use bazaar_config::PresentationSettings;
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::{ChangeKind, StoreChange};

pub use badge::badge_text;
pub use format::{relative_time, sanitize_display};
pub use sound::{SoundSink, TracingSoundSink};
pub use style::{DEFAULT_STYLE, NotificationStyle, Sound, style_for};
pub use toast::{Toast, ToastQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Evicted,
    Expired,
    Dismissed,
    Cleared,
}

/// What the rendering layer needs to repaint.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    ToastShown(Toast),
    ToastRemoved { id: Uuid, reason: RemovalReason },
    BadgeChanged(Option<String>),
}

pub struct Presenter {
    toasts: Mutex<ToastQueue>,
    unread_count: Mutex<usize>,
    sounds: Arc<dyn SoundSink>,
    sound_enabled: bool,
    events: broadcast::Sender<PresentationEvent>,
}

impl Presenter {
    pub fn new(settings: &PresentationSettings, sounds: Arc<dyn SoundSink>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            toasts: Mutex::new(ToastQueue::new(settings.max_toasts, settings.toast_ttl())),
            unread_count: Mutex::new(0),
            sounds,
            sound_enabled: settings.sound_enabled,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PresentationEvent> {
        self.events.subscribe()
    }

    pub fn visible_toasts(&self) -> Vec<Toast> {
        self.toasts.lock().visible()
    }

    pub fn unread_count(&self) -> usize {
        *self.unread_count.lock()
    }

    pub fn badge_text(&self) -> Option<String> {
        badge_text(self.unread_count())
    }

    /// Reacts to one store change.
    pub fn apply(&self, change: &StoreChange, now: Instant) {
        let badge_changed = {
            let mut unread = self.unread_count.lock();
            let changed = badge_text(*unread) != badge_text(change.unread_count);
            *unread = change.unread_count;
            changed
        };
        if badge_changed {
            self.emit(PresentationEvent::BadgeChanged(badge_text(change.unread_count)));
        }

        match &change.kind {
            ChangeKind::Merged { newly_unread } => {
                for notification in newly_unread {
                    let (toast, evicted) = self.toasts.lock().push(notification, now);
                    if let Some(evicted) = evicted {
                        self.emit(PresentationEvent::ToastRemoved {
                            id: evicted.id,
                            reason: RemovalReason::Evicted,
                        });
                    }
                    if self.sound_enabled {
                        self.sounds.play(toast.style.sound, notification);
                    }
                    debug!(notification_id = %notification.id, "Toast shown");
                    self.emit(PresentationEvent::ToastShown(toast));
                }
            }
            ChangeKind::Cleared => {
                let cleared = {
                    let mut toasts = self.toasts.lock();
                    let visible = toasts.visible();
                    toasts.clear();
                    visible
                };
                for toast in cleared {
                    self.emit(PresentationEvent::ToastRemoved {
                        id: toast.id,
                        reason: RemovalReason::Cleared,
                    });
                }
            }
            _ => {}
        }
    }

    /// Removes toasts whose display time has elapsed.
    pub fn expire_due(&self, now: Instant) {
        let expired = self.toasts.lock().expire(now);
        for toast in expired {
            self.emit(PresentationEvent::ToastRemoved {
                id: toast.id,
                reason: RemovalReason::Expired,
            });
        }
    }

    /// Dismisses a toast on explicit user action.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let removed = self.toasts.lock().dismiss(id).is_some();
        if removed {
            self.emit(PresentationEvent::ToastRemoved {
                id,
                reason: RemovalReason::Dismissed,
            });
        }
        removed
    }

    /// Consumes store changes until the store goes away, expiring toasts as
    /// their timers elapse.
    pub async fn run(self: Arc<Self>, mut changes: broadcast::Receiver<StoreChange>) {
        loop {
            let next_expiry = self.toasts.lock().next_expiry();
            tokio::select! {
                change = changes.recv() => match change {
                    Ok(change) => self.apply(&change, Instant::now()),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Presenter fell behind store changes");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = sleep_until(next_expiry.unwrap_or_else(Instant::now)), if next_expiry.is_some() => {
                    self.expire_due(Instant::now());
                }
            }
        }
        debug!("Presenter stopped");
    }

    fn emit(&self, event: PresentationEvent) {
        let _ = self.events.send(event);
    }
}
