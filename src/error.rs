//! Error types for the loans service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::loan::LoanStatus;

/// Application error codes returned in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchLoan = 5,
    BookNotAvailable = 7,
    DuplicateLoan = 8,
    MaxLoansReached = 11,
    BadValue = 18,
    InvalidTransition = 22,
}

/// A creation rule that rejected a loan request.
///
/// Variants are listed in evaluation order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoanRule {
    #[error("User is not valid or not found")]
    UserNotValid,

    #[error("The book has no available copies")]
    BookNotAvailable,

    #[error("The user already has {limit} active loans. No more loans can be created.")]
    LoanLimitReached { limit: usize },

    #[error("The user already has an active loan for this book")]
    DuplicateActiveLoan,

    #[error("Loan days must be between {min} and {max} days")]
    InvalidLoanDays { min: i32, max: i32 },
}

impl LoanRule {
    fn code(&self) -> ErrorCode {
        match self {
            LoanRule::UserNotValid => ErrorCode::NoSuchUser,
            LoanRule::BookNotAvailable => ErrorCode::BookNotAvailable,
            LoanRule::LoanLimitReached { .. } => ErrorCode::MaxLoansReached,
            LoanRule::DuplicateActiveLoan => ErrorCode::DuplicateLoan,
            LoanRule::InvalidLoanDays { .. } => ErrorCode::BadValue,
        }
    }
}

/// A lifecycle operation attempted from a state that does not allow it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Loan is not active (status {0})")]
    NotReturnable(LoanStatus),

    #[error("Only active loans can be extended (status {0})")]
    NotExtendable(LoanStatus),

    #[error("An overdue loan cannot be extended. Please return the book.")]
    ExtendOverdue,

    #[error("The loan has already been extended {max} times. No more extensions allowed.")]
    ExtensionLimitReached { max: i32 },

    #[error("Only active loans can be cancelled (status {0})")]
    NotCancellable(LoanStatus),
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Loan rejected: {0}")]
    Rule(#[from] LoanRule),

    #[error("Invalid transition: {0}")]
    Transition(#[from] TransitionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchLoan, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Rule(rule) => (StatusCode::BAD_REQUEST, rule.code(), rule.to_string()),
            AppError::Transition(err) => (
                StatusCode::CONFLICT,
                ErrorCode::InvalidTransition,
                err.to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_messages_carry_limits() {
        let rule = LoanRule::LoanLimitReached { limit: 5 };
        assert!(rule.to_string().contains('5'));

        let rule = LoanRule::InvalidLoanDays { min: 7, max: 30 };
        assert_eq!(rule.to_string(), "Loan days must be between 7 and 30 days");
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::from(LoanRule::UserNotValid).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            AppError::from(TransitionError::NotCancellable(LoanStatus::Returned)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::NotFound("Loan 9".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
