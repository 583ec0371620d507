use serde::{Deserialize, Serialize};

use super::notification::Notification;

/// Body of `GET /notifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPage {
    pub ok: bool,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: u64,
}

/// Body of the mutation endpoints (`read`, `read-all`, `DELETE`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}
