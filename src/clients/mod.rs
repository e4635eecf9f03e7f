//! Collaborator services the loan engine depends on
//!
//! User, book and notification data live in other services. The engine only
//! talks to them through these traits; the HTTP implementations are thin
//! `reqwest` clients.

pub mod books;
pub mod notifications;
pub mod users;

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use crate::{config::CollaboratorsConfig, models::Notification};

/// Failure talking to a collaborator service
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} responded with status {status}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{0} not found")]
    NotFound(String),
}

/// User management service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The user exists and is not blocked.
    ///
    /// `token` is the caller's bearer token, forwarded to the user service.
    async fn validate(&self, user_id: i64, token: Option<String>) -> Result<bool, ClientError>;
}

/// Book catalog service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInventory: Send + Sync {
    /// At least one copy is available
    async fn is_available(&self, book_id: i64) -> Result<bool, ClientError>;

    /// Add `delta` to the available copy count
    async fn adjust_copies(&self, book_id: i64, delta: i32) -> Result<(), ClientError>;
}

/// Notification service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), ClientError>;
}

/// The set of collaborators handed to the services
#[derive(Clone)]
pub struct Collaborators {
    pub users: Arc<dyn UserDirectory>,
    pub books: Arc<dyn BookInventory>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// HTTP clients for the configured service URLs
    pub fn http(config: &CollaboratorsConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            users: Arc::new(users::HttpUserDirectory::new(
                client.clone(),
                &config.users_url,
                config.service_token.clone(),
            )),
            books: Arc::new(books::HttpBookInventory::new(
                client.clone(),
                &config.books_url,
                config.service_token.clone(),
            )),
            notifier: Arc::new(notifications::HttpNotifier::new(
                client,
                &config.notifications_url,
            )),
        })
    }
}

/// Attach a bearer token, if any
fn authorized(
    request: reqwest::RequestBuilder,
    token: Option<&str>,
) -> reqwest::RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}
