//! User management service client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{authorized, ClientError, UserDirectory};

/// Subset of the user service's user representation
#[derive(Debug, Deserialize)]
struct UserStatusView {
    status: Option<String>,
}

impl UserStatusView {
    fn is_blocked(&self) -> bool {
        matches!(self.status.as_deref(), Some("BLOQUEADO") | Some("BLOCKED"))
    }
}

pub struct HttpUserDirectory {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpUserDirectory {
    pub fn new(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn validate(&self, user_id: i64, token: Option<String>) -> Result<bool, ClientError> {
        let url = format!("{}/api/users/{}", self.base_url, user_id);
        // The caller's own token first; the service token covers sweeps and tooling
        let token = token.as_deref().or(self.token.as_deref());
        let response = authorized(self.client.get(&url), token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => {
                let user: UserStatusView = response.json().await?;
                Ok(!user.is_blocked())
            }
            status => Err(ClientError::Status {
                service: "users",
                status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_status() {
        let user: UserStatusView = serde_json::from_str(r#"{"id": 3, "status": "BLOQUEADO"}"#).unwrap();
        assert!(user.is_blocked());

        let user: UserStatusView = serde_json::from_str(r#"{"id": 3, "status": "ACTIVO"}"#).unwrap();
        assert!(!user.is_blocked());
    }
}
