use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt, future};
use reqwest::Url;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::info;

use crate::error::{SyncError, SyncResult};

/// Text frames from an open push channel. The stream ends when the server
/// closes the connection; an `Err` item means the connection dropped.
pub type PushStream = Pin<Box<dyn Stream<Item = SyncResult<String>> + Send>>;

/// Opens the persistent, authenticated push channel.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, token: &str) -> SyncResult<PushStream>;
}

/// WebSocket push channel. The token travels as a `token` query parameter,
/// matching the backend's upgrade handler.
pub struct WsPushConnector {
    ws_url: String,
}

impl WsPushConnector {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    fn url_with_token(&self, token: &str) -> SyncResult<Url> {
        let mut url =
            Url::parse(&self.ws_url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}

#[async_trait]
impl PushConnector for WsPushConnector {
    async fn connect(&self, token: &str) -> SyncResult<PushStream> {
        let url = self.url_with_token(token)?;
        let (socket, _response) = connect_async(url.as_str()).await.map_err(|e| {
            let err = SyncError::from(e);
            if err.is_auth() { SyncError::Unauthorized } else { err }
        })?;
        info!(host = ?url.host_str(), "Push channel open");

        // Pings are answered by tungstenite while the stream is polled; only
        // text frames are surfaced.
        let frames = socket
            .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
            .filter_map(|frame| {
                future::ready(match frame {
                    Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                    Ok(_) => None,
                    Err(e) => Some(Err(SyncError::from(e))),
                })
            });

        Ok(Box::pin(frames))
    }
}
