//! Loan history repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{LoanHistory, NewHistoryEntry},
};

use super::HistoryRepository;

#[derive(Clone)]
pub struct PgHistoryRepository {
    pool: Pool<Postgres>,
}

impl PgHistoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn append(&self, entry: &NewHistoryEntry) -> AppResult<LoanHistory> {
        let row = sqlx::query_as::<_, LoanHistory>(
            r#"
            INSERT INTO loan_history (loan_id, action, notes, timestamp)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(entry.loan_id)
        .bind(entry.action)
        .bind(&entry.notes)
        .bind(entry.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_for_loan(&self, loan_id: i64) -> AppResult<Vec<LoanHistory>> {
        let rows = sqlx::query_as::<_, LoanHistory>(
            "SELECT * FROM loan_history WHERE loan_id = $1 ORDER BY timestamp DESC, id DESC",
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
