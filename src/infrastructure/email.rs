use crate::domain::notification::Notification;
use crate::domain::ports::Notifier;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Notifier that posts rendered notifications to a transactional mail API.
pub struct HttpMailer {
    http: reqwest::Client,
    endpoint: Url,
    token: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(base_url: Url, token: String, sender: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let endpoint = base_url.join("email")?;
        Ok(Self {
            http,
            endpoint,
            token,
            sender,
        })
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn notify(&self, email: &str, notification: &Notification) -> Result<()> {
        let body = serde_json::json!({
            "from": self.sender,
            "to": email,
            "subject": notification.subject(),
            "text_body": notification.body(),
        });

        self.http
            .post(self.endpoint.clone())
            .header("X-Server-Token", &self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        log::debug!("delivered {} notification to {}", notification.kind(), email);
        Ok(())
    }
}
