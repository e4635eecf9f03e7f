//! Repository layer for loan storage
//!
//! The services only see the [`LoansRepository`] and [`HistoryRepository`]
//! traits. Postgres backs them in production; [`memory::MemoryStore`] backs
//! them in tests and in-memory local runs.

pub mod history;
pub mod loans;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Loan, LoanHistory, LoanStatus, NewHistoryEntry, NewLoan},
};

#[async_trait]
pub trait LoansRepository: Send + Sync {
    /// Insert an ACTIVE loan and return it with its id
    async fn create(&self, loan: &NewLoan) -> AppResult<Loan>;

    /// Get loan by ID, `NotFound` if missing
    async fn get_by_id(&self, id: i64) -> AppResult<Loan>;

    /// Persist the mutable fields of a loan
    async fn update(&self, loan: &Loan) -> AppResult<Loan>;

    /// All loans of a user, optionally restricted to one status
    async fn list_by_user(&self, user_id: i64, status: Option<LoanStatus>) -> AppResult<Vec<Loan>>;

    /// ACTIVE and OVERDUE loans of a user
    async fn list_open_by_user(&self, user_id: i64) -> AppResult<Vec<Loan>>;

    async fn list_by_book(&self, book_id: i64) -> AppResult<Vec<Loan>>;

    /// ACTIVE and OVERDUE loans whose due date is before `today`
    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<Loan>>;

    /// ACTIVE loans due exactly on `due_date`
    async fn list_active_due_on(&self, due_date: NaiveDate) -> AppResult<Vec<Loan>>;

    /// Check the storage backend answers
    async fn ping(&self) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append(&self, entry: &NewHistoryEntry) -> AppResult<LoanHistory>;

    /// Entries of a loan, newest first
    async fn list_for_loan(&self, loan_id: i64) -> AppResult<Vec<LoanHistory>>;
}

/// Main repository struct holding the storage backends
#[derive(Clone)]
pub struct Repository {
    pub loans: Arc<dyn LoansRepository>,
    pub history: Arc<dyn HistoryRepository>,
}

impl Repository {
    /// Create a Postgres-backed repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            loans: Arc::new(loans::PgLoansRepository::new(pool.clone())),
            history: Arc::new(history::PgHistoryRepository::new(pool)),
        }
    }

    /// Create a repository that keeps everything in process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            loans: store.clone(),
            history: store,
        }
    }
}
