//! Best-effort side effects of loan transitions
//!
//! The loan row is the source of truth. Inventory adjustments and
//! notifications run after it is committed; their failures are logged and
//! never undo or fail the transition.

use std::sync::Arc;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use crate::{
    clients::{BookInventory, Notifier},
    models::{Loan, Notification},
};

#[derive(Clone)]
pub struct SideEffects {
    books: Arc<dyn BookInventory>,
    notifications: UnboundedSender<Notification>,
}

impl SideEffects {
    pub fn new(books: Arc<dyn BookInventory>, notifications: UnboundedSender<Notification>) -> Self {
        Self { books, notifications }
    }

    /// Add `delta` copies back to (or take them from) the book's inventory
    pub async fn adjust_inventory(&self, loan: &Loan, delta: i32) {
        if let Err(e) = self.books.adjust_copies(loan.book_id, delta).await {
            tracing::warn!(
                loan_id = loan.id,
                book_id = loan.book_id,
                delta,
                "Failed to update book copies: {}",
                e
            );
        }
    }

    /// Queue a notification without waiting for its delivery
    pub fn notify(&self, notification: Notification) {
        let user_id = notification.user_id;
        if self.notifications.send(notification).is_err() {
            tracing::warn!(user_id, "Notification queue closed, notification dropped");
        }
    }
}

/// Drains the notification queue into the notification service
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    queue: UnboundedReceiver<Notification>,
}

impl NotificationDispatcher {
    /// Create the queue and the dispatcher that consumes it
    pub fn new(notifier: Arc<dyn Notifier>) -> (UnboundedSender<Notification>, Self) {
        let (sender, queue) = mpsc::unbounded_channel();
        (sender, Self { notifier, queue })
    }

    /// Deliver until every sender is dropped
    pub async fn run(mut self) {
        while let Some(notification) = self.queue.recv().await {
            match self.notifier.notify(&notification).await {
                Ok(()) => tracing::debug!(
                    user_id = notification.user_id,
                    kind = ?notification.kind,
                    "Notification sent"
                ),
                Err(e) => tracing::warn!(
                    user_id = notification.user_id,
                    kind = ?notification.kind,
                    "Failed to send notification: {}",
                    e
                ),
            }
        }
        tracing::info!("Notification dispatcher stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
