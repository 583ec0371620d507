use bazaar_db::models::Notification;
use tracing::info;

use super::style::Sound;

/// Audio cue output. The host decides how a cue is actually played.
pub trait SoundSink: Send + Sync {
    fn play(&self, sound: Sound, notification: &Notification);
}

/// Logs cues instead of playing them (headless hosts, tests).
pub struct TracingSoundSink;

impl SoundSink for TracingSoundSink {
    fn play(&self, sound: Sound, notification: &Notification) {
        info!(%sound, notification_id = %notification.id, "Notification sound");
    }
}
