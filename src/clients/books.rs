//! Book catalog service client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{authorized, BookInventory, ClientError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookAvailability {
    available: Option<bool>,
    available_copies: Option<i32>,
}

impl BookAvailability {
    fn has_copies(&self) -> bool {
        match self.available_copies {
            Some(copies) => copies > 0,
            None => self.available.unwrap_or(false),
        }
    }
}

pub struct HttpBookInventory {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBookInventory {
    pub fn new(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl BookInventory for HttpBookInventory {
    async fn is_available(&self, book_id: i64) -> Result<bool, ClientError> {
        let url = format!("{}/api/books/{}/availability", self.base_url, book_id);
        let response = authorized(self.client.get(&url), self.token.as_deref())
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => {
                let availability: BookAvailability = response.json().await?;
                Ok(availability.has_copies())
            }
            status => Err(ClientError::Status {
                service: "books",
                status,
            }),
        }
    }

    async fn adjust_copies(&self, book_id: i64, delta: i32) -> Result<(), ClientError> {
        let url = format!("{}/api/books/{}/copies", self.base_url, book_id);
        let response = authorized(self.client.patch(&url), self.token.as_deref())
            .query(&[("change", delta)])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(format!("Book {}", book_id))),
            status if status.is_success() => Ok(()),
            status => Err(ClientError::Status {
                service: "books",
                status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_prefers_copy_count() {
        let view: BookAvailability =
            serde_json::from_str(r#"{"bookId": 5, "available": true, "availableCopies": 0}"#).unwrap();
        assert!(!view.has_copies());

        let view: BookAvailability = serde_json::from_str(r#"{"available": true}"#).unwrap();
        assert!(view.has_copies());
    }
}
