//! Notification service client

use async_trait::async_trait;
use reqwest::Client;

use crate::models::Notification;

use super::{ClientError, Notifier};

pub struct HttpNotifier {
    client: Client,
    base_url: String,
}

impl HttpNotifier {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), ClientError> {
        let url = format!("{}/api/notifications", self.base_url);
        let response = self.client.post(&url).json(notification).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Status {
                service: "notifications",
                status: response.status(),
            })
        }
    }
}
