use async_trait::async_trait;
use bazaar_config::ApiSettings;
use bazaar_db::models::{Ack, NotificationId, NotificationPage};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Response, StatusCode};
use tracing::debug;

use crate::error::{SyncError, SyncResult};

/// Query for `GET /notifications`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchQuery {
    pub page: u32,
    pub size: u32,
    /// Only records newer than this cursor. `None` fetches from the top.
    pub since: Option<DateTime<Utc>>,
}

/// The notification endpoints of the REST backend.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn fetch(&self, token: &str, query: &FetchQuery) -> SyncResult<NotificationPage>;
    async fn mark_read(&self, token: &str, id: &NotificationId) -> SyncResult<()>;
    async fn mark_all_read(&self, token: &str) -> SyncResult<()>;
    async fn delete(&self, token: &str, id: &NotificationId) -> SyncResult<()>;
}

pub struct HttpNotificationApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotificationApi {
    pub fn new(settings: &ApiSettings) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn ack(resp: Response) -> SyncResult<()> {
        let ack = check(resp)?.json::<Ack>().await?;
        if ack.ok { Ok(()) } else { Err(SyncError::Rejected) }
    }
}

/// Maps 401 to the terminal auth error and any other non-success status to
/// `SyncError::Status`.
fn check(resp: Response) -> SyncResult<Response> {
    match resp.status() {
        StatusCode::UNAUTHORIZED => Err(SyncError::Unauthorized),
        status if !status.is_success() => Err(SyncError::Status(status.as_u16())),
        _ => Ok(resp),
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn fetch(&self, token: &str, query: &FetchQuery) -> SyncResult<NotificationPage> {
        let mut request = self
            .client
            .get(self.url("/notifications"))
            .bearer_auth(token)
            .query(&[("page", query.page), ("size", query.size)]);
        if let Some(since) = query.since {
            request = request.query(&[("since", since.to_rfc3339_opts(SecondsFormat::Millis, true))]);
        }

        let page = check(request.send().await?)?
            .json::<NotificationPage>()
            .await?;
        if !page.ok {
            return Err(SyncError::Rejected);
        }
        debug!(
            count = page.notifications.len(),
            server_unread = page.unread_count,
            "Fetched notifications"
        );
        Ok(page)
    }

    async fn mark_read(&self, token: &str, id: &NotificationId) -> SyncResult<()> {
        let resp = self
            .client
            .post(self.url(&format!("/notifications/{}/read", urlencoding::encode(id.as_str()))))
            .bearer_auth(token)
            .send()
            .await?;
        Self::ack(resp).await
    }

    async fn mark_all_read(&self, token: &str) -> SyncResult<()> {
        let resp = self
            .client
            .post(self.url("/notifications/read-all"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::ack(resp).await
    }

    async fn delete(&self, token: &str, id: &NotificationId) -> SyncResult<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/notifications/{}", urlencoding::encode(id.as_str()))))
            .bearer_auth(token)
            .send()
            .await?;
        Self::ack(resp).await
    }
}
