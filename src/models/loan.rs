//! Loan model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use validator::Validate;

/// Loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Returned,
    Overdue,
    Cancelled,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Returned => "RETURNED",
            LoanStatus::Overdue => "OVERDUE",
            LoanStatus::Cancelled => "CANCELLED",
        }
    }

    /// ACTIVE or OVERDUE: the book is still out
    pub fn is_open(&self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Overdue)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(LoanStatus::Active),
            "RETURNED" => Ok(LoanStatus::Returned),
            "OVERDUE" => Ok(LoanStatus::Overdue),
            "CANCELLED" => Ok(LoanStatus::Cancelled),
            other => Err(format!("Unknown loan status: {}", other)),
        }
    }
}

super::text_column!(LoanStatus);

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Set only when the book comes back
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub loan_days: i32,
    #[schema(value_type = String, example = "0.00")]
    pub fine_amount: Decimal,
    pub extensions_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// A loan is overdue while it is still out and its due date has passed.
    ///
    /// Derived from dates, not only from the stored status: an ACTIVE loan
    /// the sweep has not visited yet is overdue as well.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date < today
    }
}

/// Values needed to insert a new loan row
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub user_id: i64,
    pub book_id: i64,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub loan_days: i32,
    pub created_at: DateTime<Utc>,
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    #[validate(range(min = 1, message = "User ID must be positive"))]
    pub user_id: i64,
    #[validate(range(min = 1, message = "Book ID must be positive"))]
    pub book_id: i64,
    /// Loan length in days (configured default when absent)
    pub loan_days: Option<i32>,
}

/// Diagnostic result of the creation rules
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LoanValidation {
    pub user_id: i64,
    pub book_id: i64,
    pub user_exists: bool,
    pub book_available: bool,
    pub within_loan_limit: bool,
    pub no_active_loan_for_book: bool,
    pub valid_loan_days: bool,
    pub valid: bool,
    pub message: String,
}

/// Fine estimate for a loan as of today
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FineCalculation {
    pub loan_id: i64,
    pub days_overdue: i64,
    #[schema(value_type = String, example = "1.50")]
    pub daily_fine_rate: Decimal,
    #[schema(value_type = String, example = "7.50")]
    pub total_fine: Decimal,
    pub message: String,
}

/// One business rule and the value it is configured with
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RuleDescription {
    pub name: String,
    pub description: String,
}

/// The loan rule set currently in force
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BusinessRulesReport {
    pub summary: String,
    pub rules: Vec<RuleDescription>,
}
