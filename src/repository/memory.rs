//! In-memory storage for loans and their history

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use crate::{
    error::{AppError, AppResult},
    models::{Loan, LoanHistory, LoanStatus, NewHistoryEntry, NewLoan},
};

use super::{HistoryRepository, LoansRepository};

#[derive(Default)]
struct Tables {
    loans: BTreeMap<i64, Loan>,
    history: Vec<LoanHistory>,
    last_loan_id: i64,
    last_history_id: i64,
}

/// Both repositories over one set of in-process tables
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn select<F>(&self, filter: F) -> Vec<Loan>
    where
        F: Fn(&Loan) -> bool,
    {
        self.tables()
            .loans
            .values()
            .filter(|loan| filter(*loan))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LoansRepository for MemoryStore {
    async fn create(&self, loan: &NewLoan) -> AppResult<Loan> {
        let mut tables = self.tables();
        tables.last_loan_id += 1;

        let row = Loan {
            id: tables.last_loan_id,
            user_id: loan.user_id,
            book_id: loan.book_id,
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            return_date: None,
            status: LoanStatus::Active,
            loan_days: loan.loan_days,
            fine_amount: Decimal::ZERO,
            extensions_count: 0,
            created_at: loan.created_at,
            updated_at: loan.created_at,
        };
        tables.loans.insert(row.id, row.clone());

        Ok(row)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        self.tables()
            .loans
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    async fn update(&self, loan: &Loan) -> AppResult<Loan> {
        let mut tables = self.tables();
        let row = tables
            .loans
            .get_mut(&loan.id)
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan.id)))?;

        // loan_date, loan_days and created_at are immutable
        row.due_date = loan.due_date;
        row.return_date = loan.return_date;
        row.status = loan.status;
        row.fine_amount = loan.fine_amount;
        row.extensions_count = loan.extensions_count;
        row.updated_at = loan.updated_at;

        Ok(row.clone())
    }

    async fn list_by_user(&self, user_id: i64, status: Option<LoanStatus>) -> AppResult<Vec<Loan>> {
        let mut loans = self.select(|loan| {
            loan.user_id == user_id && status.map_or(true, |status| loan.status == status)
        });
        loans.sort_by(|a, b| (b.loan_date, b.id).cmp(&(a.loan_date, a.id)));
        Ok(loans)
    }

    async fn list_open_by_user(&self, user_id: i64) -> AppResult<Vec<Loan>> {
        let mut loans = self.select(|loan| loan.user_id == user_id && loan.status.is_open());
        loans.sort_by_key(|loan| (loan.due_date, loan.id));
        Ok(loans)
    }

    async fn list_by_book(&self, book_id: i64) -> AppResult<Vec<Loan>> {
        let mut loans = self.select(|loan| loan.book_id == book_id);
        loans.sort_by(|a, b| (b.loan_date, b.id).cmp(&(a.loan_date, a.id)));
        Ok(loans)
    }

    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<Loan>> {
        let mut loans = self.select(|loan| loan.is_overdue(today));
        loans.sort_by_key(|loan| (loan.due_date, loan.id));
        Ok(loans)
    }

    async fn list_active_due_on(&self, due_date: NaiveDate) -> AppResult<Vec<Loan>> {
        Ok(self.select(|loan| loan.status == LoanStatus::Active && loan.due_date == due_date))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for MemoryStore {
    async fn append(&self, entry: &NewHistoryEntry) -> AppResult<LoanHistory> {
        let mut tables = self.tables();
        tables.last_history_id += 1;

        let row = LoanHistory {
            id: tables.last_history_id,
            loan_id: entry.loan_id,
            action: entry.action,
            notes: Some(entry.notes.clone()),
            timestamp: entry.timestamp,
        };
        tables.history.push(row.clone());

        Ok(row)
    }

    async fn list_for_loan(&self, loan_id: i64) -> AppResult<Vec<LoanHistory>> {
        let mut rows: Vec<LoanHistory> = self
            .tables()
            .history
            .iter()
            .filter(|row| row.loan_id == loan_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryAction;
    use chrono::{Duration, Utc};

    fn new_loan(user_id: i64, book_id: i64, due_date: NaiveDate) -> NewLoan {
        NewLoan {
            user_id,
            book_id,
            loan_date: due_date - Duration::days(14),
            due_date,
            loan_days: 14,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::default();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let first = store.create(&new_loan(1, 10, day)).await.unwrap();
        let second = store.create(&new_loan(1, 11, day)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.status, LoanStatus::Active);
    }

    #[tokio::test]
    async fn test_open_and_overdue_queries() {
        let store = MemoryStore::default();
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let late = store.create(&new_loan(1, 10, today - Duration::days(2))).await.unwrap();
        let on_time = store.create(&new_loan(1, 11, today + Duration::days(2))).await.unwrap();
        let mut done = store.create(&new_loan(1, 12, today - Duration::days(5))).await.unwrap();
        done.status = LoanStatus::Returned;
        done.return_date = Some(today);
        store.update(&done).await.unwrap();

        let open: Vec<i64> = store.list_open_by_user(1).await.unwrap().iter().map(|l| l.id).collect();
        assert_eq!(open, vec![late.id, on_time.id]);

        let overdue: Vec<i64> = store.list_overdue(today).await.unwrap().iter().map(|l| l.id).collect();
        assert_eq!(overdue, vec![late.id]);

        let returned = store.list_by_user(1, Some(LoanStatus::Returned)).await.unwrap();
        assert_eq!(returned.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_loan_is_not_found() {
        let store = MemoryStore::default();
        assert!(matches!(store.get_by_id(42).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let store = MemoryStore::default();
        let start = Utc::now();

        for (offset, action) in [(0, HistoryAction::Created), (1, HistoryAction::Extended)] {
            store
                .append(&NewHistoryEntry {
                    loan_id: 7,
                    action,
                    notes: String::new(),
                    timestamp: start + Duration::minutes(offset),
                })
                .await
                .unwrap();
        }

        let rows = store.list_for_loan(7).await.unwrap();
        assert_eq!(rows[0].action, HistoryAction::Extended);
        assert_eq!(rows[1].action, HistoryAction::Created);
    }
}
