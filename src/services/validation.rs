//! Loan creation rules

use std::sync::Arc;

use crate::{
    clients::{BookInventory, UserDirectory},
    config::LoanConfig,
    error::{AppResult, LoanRule},
    models::loan::LoanValidation,
    repository::LoansRepository,
};

/// Evaluates the creation rules against the collaborators and the loan table.
///
/// Rules are checked in a fixed order: user, book availability, active loan
/// limit, duplicate open loan, loan length. A collaborator that cannot be
/// reached fails its check.
#[derive(Clone)]
pub struct LoanValidator {
    loans: Arc<dyn LoansRepository>,
    users: Arc<dyn UserDirectory>,
    books: Arc<dyn BookInventory>,
    config: LoanConfig,
}

impl LoanValidator {
    pub fn new(
        loans: Arc<dyn LoansRepository>,
        users: Arc<dyn UserDirectory>,
        books: Arc<dyn BookInventory>,
        config: LoanConfig,
    ) -> Self {
        Self {
            loans,
            users,
            books,
            config,
        }
    }

    /// Evaluate every rule and report each outcome
    pub async fn validate_creation(
        &self,
        user_id: i64,
        book_id: i64,
        loan_days: Option<i32>,
        token: Option<&str>,
    ) -> AppResult<LoanValidation> {
        let user_exists = self.user_valid(user_id, token).await;
        let book_available = self.book_available(book_id).await;

        let open = self.loans.list_open_by_user(user_id).await?;
        let within_loan_limit = open.len() < self.config.max_active_loans;
        let no_active_loan_for_book = !open.iter().any(|loan| loan.book_id == book_id);
        let valid_loan_days = self.days_in_range(self.resolve_days(loan_days));

        let first_violation = [
            (user_exists, LoanRule::UserNotValid),
            (book_available, LoanRule::BookNotAvailable),
            (within_loan_limit, self.limit_rule()),
            (no_active_loan_for_book, LoanRule::DuplicateActiveLoan),
            (valid_loan_days, self.days_rule()),
        ]
        .into_iter()
        .find(|(passed, _)| !passed)
        .map(|(_, rule)| rule);

        let (valid, message) = match first_violation {
            Some(rule) => (false, rule.to_string()),
            None => (true, "Validation successful".to_string()),
        };

        Ok(LoanValidation {
            user_id,
            book_id,
            user_exists,
            book_available,
            within_loan_limit,
            no_active_loan_for_book,
            valid_loan_days,
            valid,
            message,
        })
    }

    /// Stop at the first violated rule; returns the loan length to use
    pub async fn check_creation(
        &self,
        user_id: i64,
        book_id: i64,
        loan_days: Option<i32>,
        token: Option<&str>,
    ) -> AppResult<i32> {
        if !self.user_valid(user_id, token).await {
            return Err(LoanRule::UserNotValid.into());
        }
        if !self.book_available(book_id).await {
            return Err(LoanRule::BookNotAvailable.into());
        }

        let open = self.loans.list_open_by_user(user_id).await?;
        if open.len() >= self.config.max_active_loans {
            return Err(self.limit_rule().into());
        }
        if open.iter().any(|loan| loan.book_id == book_id) {
            return Err(LoanRule::DuplicateActiveLoan.into());
        }

        let days = self.resolve_days(loan_days);
        if !self.days_in_range(days) {
            return Err(self.days_rule().into());
        }

        Ok(days)
    }

    async fn user_valid(&self, user_id: i64, token: Option<&str>) -> bool {
        match self.users.validate(user_id, token.map(str::to_string)).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(user_id, "User validation failed: {}", e);
                false
            }
        }
    }

    async fn book_available(&self, book_id: i64) -> bool {
        match self.books.is_available(book_id).await {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!(book_id, "Book availability check failed: {}", e);
                false
            }
        }
    }

    fn resolve_days(&self, loan_days: Option<i32>) -> i32 {
        loan_days.unwrap_or(self.config.default_days)
    }

    fn days_in_range(&self, days: i32) -> bool {
        (self.config.min_days..=self.config.max_days).contains(&days)
    }

    fn limit_rule(&self) -> LoanRule {
        LoanRule::LoanLimitReached {
            limit: self.config.max_active_loans,
        }
    }

    fn days_rule(&self) -> LoanRule {
        LoanRule::InvalidLoanDays {
            min: self.config.min_days,
            max: self.config.max_days,
        }
    }
}
