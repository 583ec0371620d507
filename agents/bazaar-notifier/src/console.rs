//! Terminal rendering and the stdin command language.

use std::io::Write;

use bazaar_db::models::{Notification, NotificationId};
use bazaar_services::presentation::{Sound, SoundSink, Toast, relative_time, sanitize_display};
use bazaar_services::{ConnectionState, PresentationEvent, StoreSnapshot};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

pub const HELP: &str = "\
commands:
  list            show the inbox, newest first
  read <id>       mark one notification read
  read-all        mark everything read
  delete <id>     delete one notification
  more <page>     load an older page
  hide | show     simulate the window being hidden or shown
  focus           simulate regaining focus
  logout          sign out, clearing the local cache
  quit            exit, keeping the local cache";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Read(NotificationId),
    ReadAll,
    Delete(NotificationId),
    More(u32),
    Hide,
    Show,
    Focus,
    Logout,
    Quit,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err("empty command".to_string());
        };
        let arg = parts.next();

        let command = match (verb, arg) {
            ("list" | "ls", None) => Command::List,
            ("read", Some(id)) => Command::Read(NotificationId::from(id)),
            ("read-all", None) => Command::ReadAll,
            ("delete" | "rm", Some(id)) => Command::Delete(NotificationId::from(id)),
            ("more", Some(page)) => Command::More(
                page.parse()
                    .ok()
                    .filter(|p| *p > 0)
                    .ok_or_else(|| format!("invalid page: {page}"))?,
            ),
            ("hide", None) => Command::Hide,
            ("show", None) => Command::Show,
            ("focus", None) => Command::Focus,
            ("logout", None) => Command::Logout,
            ("quit" | "exit", None) => Command::Quit,
            ("help" | "?", None) => Command::Help,
            ("read" | "delete" | "rm" | "more", None) => {
                return Err(format!("{verb} needs an argument"));
            }
            _ => return Err(format!("unknown command: {}", line.trim())),
        };

        if parts.next().is_some() {
            return Err(format!("too many arguments: {}", line.trim()));
        }
        Ok(command)
    }
}

pub fn render_toast(toast: &Toast) -> String {
    format!(
        "[{}] {}: {}",
        toast.style.icon,
        sanitize_display(&toast.title),
        sanitize_display(&toast.body)
    )
}

fn render_row(notification: &Notification, now: DateTime<Utc>) -> String {
    let marker = if notification.is_unread() { '*' } else { ' ' };
    format!(
        "{marker} {:<12} {:<40} {}",
        notification.id,
        sanitize_display(&notification.title),
        relative_time(notification.created_at, now)
    )
}

pub fn render_inbox(snapshot: &StoreSnapshot, now: DateTime<Utc>) -> String {
    if snapshot.notifications.is_empty() {
        return "inbox is empty".to_string();
    }
    let mut out = format!("{} unread\n", snapshot.unread_count);
    for notification in &snapshot.notifications {
        out.push_str(&render_row(notification, now));
        out.push('\n');
    }
    out
}

/// Rings the terminal bell for each cue.
pub struct BellSoundSink;

impl SoundSink for BellSoundSink {
    fn play(&self, sound: Sound, notification: &Notification) {
        debug!(%sound, notification_id = %notification.id, "Ringing bell");
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

/// Prints toasts, badge changes and connection state until both feeds close.
pub async fn render(
    mut presented: broadcast::Receiver<PresentationEvent>,
    mut states: broadcast::Receiver<ConnectionState>,
) {
    let mut states_open = true;
    loop {
        tokio::select! {
            event = presented.recv() => match event {
                Ok(PresentationEvent::ToastShown(toast)) => println!("{}", render_toast(&toast)),
                Ok(PresentationEvent::BadgeChanged(Some(badge))) => println!("({badge} unread)"),
                Ok(PresentationEvent::BadgeChanged(None)) => println!("(all caught up)"),
                Ok(PresentationEvent::ToastRemoved { .. }) => {}
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            state = states.recv(), if states_open => match state {
                Ok(state) => println!("-- {}", state.phase),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => states_open = false,
            },
        }
    }
}
