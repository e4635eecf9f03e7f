//! Business logic services

pub mod fines;
pub mod history;
pub mod lifecycle;
pub mod loans;
pub mod locks;
pub mod scheduler;
pub mod side_effects;
pub mod validation;

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    clients::Collaborators, clock::Clock, config::LoanConfig, models::Notification,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services with the given repository and collaborators.
    ///
    /// `notifications` is the queue drained by a
    /// [`side_effects::NotificationDispatcher`].
    pub fn new(
        repository: Repository,
        collaborators: &Collaborators,
        notifications: UnboundedSender<Notification>,
        clock: Arc<dyn Clock>,
        loan_config: LoanConfig,
    ) -> Self {
        Self {
            loans: loans::LoansService::new(
                repository,
                collaborators,
                notifications,
                clock,
                loan_config,
            ),
        }
    }
}
