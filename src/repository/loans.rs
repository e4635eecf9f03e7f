//! Loans repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Loan, LoanStatus, NewLoan},
};

use super::LoansRepository;

#[derive(Clone)]
pub struct PgLoansRepository {
    pool: Pool<Postgres>,
}

impl PgLoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoansRepository for PgLoansRepository {
    async fn create(&self, loan: &NewLoan) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                user_id, book_id, loan_date, due_date, status, loan_days,
                fine_amount, extensions_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7, $7)
            RETURNING *
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .bind(LoanStatus::Active)
        .bind(loan.loan_days)
        .bind(loan.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(loan)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    async fn update(&self, loan: &Loan) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET due_date = $2, return_date = $3, status = $4, fine_amount = $5,
                extensions_count = $6, updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(loan.due_date)
        .bind(loan.return_date)
        .bind(loan.status)
        .bind(loan.fine_amount)
        .bind(loan.extensions_count)
        .bind(loan.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan.id)))
    }

    async fn list_by_user(&self, user_id: i64, status: Option<LoanStatus>) -> AppResult<Vec<Loan>> {
        let loans = match status {
            Some(status) => {
                sqlx::query_as::<_, Loan>(
                    "SELECT * FROM loans WHERE user_id = $1 AND status = $2 ORDER BY loan_date DESC, id DESC",
                )
                .bind(user_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Loan>(
                    "SELECT * FROM loans WHERE user_id = $1 ORDER BY loan_date DESC, id DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(loans)
    }

    async fn list_open_by_user(&self, user_id: i64) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE user_id = $1 AND status IN ('ACTIVE', 'OVERDUE')
            ORDER BY due_date, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn list_by_book(&self, book_id: i64) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE book_id = $1 ORDER BY loan_date DESC, id DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE status IN ('ACTIVE', 'OVERDUE') AND due_date < $1
            ORDER BY due_date, id
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn list_active_due_on(&self, due_date: NaiveDate) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE status = 'ACTIVE' AND due_date = $1 ORDER BY id",
        )
        .bind(due_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
