//! Loan history recorder

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::AppResult,
    models::{HistoryAction, LoanHistory, NewHistoryEntry},
    repository::HistoryRepository,
};

/// Appends one history row per transition.
///
/// A failed append is logged and swallowed: the transition it describes is
/// already committed.
#[derive(Clone)]
pub struct HistoryRecorder {
    repository: Arc<dyn HistoryRepository>,
    clock: Arc<dyn Clock>,
}

impl HistoryRecorder {
    pub fn new(repository: Arc<dyn HistoryRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn record(&self, loan_id: i64, action: HistoryAction, notes: impl Into<String>) {
        let entry = NewHistoryEntry {
            loan_id,
            action,
            notes: notes.into(),
            timestamp: self.clock.now(),
        };

        match self.repository.append(&entry).await {
            Ok(row) => tracing::debug!(loan_id, history_id = row.id, %action, "History recorded"),
            Err(e) => tracing::error!(
                loan_id,
                %action,
                "Failed to record loan history: {}",
                e
            ),
        }
    }

    /// History of a loan, newest first
    pub async fn list(&self, loan_id: i64) -> AppResult<Vec<LoanHistory>> {
        self.repository.list_for_loan(loan_id).await
    }
}
