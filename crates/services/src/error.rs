use bazaar_db::{DbError, models::NotificationId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Unexpected status: {0}")]
    Status(u16),
    #[error("Request rejected by server")]
    Rejected,
    #[error("Notification not found: {0}")]
    NotFound(NotificationId),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Cache error: {0}")]
    Cache(#[from] DbError),
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SyncError {
    /// Authentication failures end the session; everything else is retried.
    pub fn is_auth(&self) -> bool {
        match self {
            SyncError::Unauthorized => true,
            SyncError::Http(e) => e.status().is_some_and(|s| s.as_u16() == 401),
            SyncError::WebSocket(tokio_tungstenite::tungstenite::Error::Http(resp)) => {
                resp.status().as_u16() == 401
            }
            _ => false,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
