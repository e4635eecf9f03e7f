//! Loan management service

use chrono::Duration;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use validator::Validate;

use crate::{
    clients::Collaborators,
    clock::Clock,
    config::LoanConfig,
    error::AppResult,
    models::{
        loan::{BusinessRulesReport, FineCalculation, LoanValidation, RuleDescription},
        CreateLoan, HistoryAction, Loan, LoanHistory, LoanStatus, NewLoan, Notification,
        NotificationType, Priority,
    },
    repository::Repository,
};

use super::{
    fines,
    history::HistoryRecorder,
    lifecycle::{self, OverdueOutcome},
    locks::KeyedLocks,
    side_effects::SideEffects,
    validation::LoanValidator,
};

/// Loan lifecycle operations.
///
/// Every mutation of an existing loan runs under that loan's lock, creation
/// runs under the borrower's lock. The loan row is written first; inventory,
/// history and notifications follow and never fail the operation.
#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    validator: LoanValidator,
    history: HistoryRecorder,
    effects: SideEffects,
    clock: Arc<dyn Clock>,
    config: LoanConfig,
    loan_locks: Arc<KeyedLocks>,
    user_locks: Arc<KeyedLocks>,
}

impl LoansService {
    pub fn new(
        repository: Repository,
        collaborators: &Collaborators,
        notifications: UnboundedSender<Notification>,
        clock: Arc<dyn Clock>,
        config: LoanConfig,
    ) -> Self {
        Self {
            validator: LoanValidator::new(
                repository.loans.clone(),
                collaborators.users.clone(),
                collaborators.books.clone(),
                config.clone(),
            ),
            history: HistoryRecorder::new(repository.history.clone(), clock.clone()),
            effects: SideEffects::new(collaborators.books.clone(), notifications),
            repository,
            clock,
            config,
            loan_locks: Arc::new(KeyedLocks::default()),
            user_locks: Arc::new(KeyedLocks::default()),
        }
    }

    /// Create a new loan (borrow a book).
    ///
    /// `token` is the caller's bearer token, passed on to the user service.
    pub async fn create_loan(&self, request: CreateLoan, token: Option<&str>) -> AppResult<Loan> {
        request.validate()?;

        let guard = self.user_locks.lock(request.user_id).await;
        let loan_days = self
            .validator
            .check_creation(request.user_id, request.book_id, request.loan_days, token)
            .await?;

        let today = self.clock.today();
        let loan = self
            .repository
            .loans
            .create(&NewLoan {
                user_id: request.user_id,
                book_id: request.book_id,
                loan_date: today,
                due_date: today + Duration::days(i64::from(loan_days)),
                loan_days,
                created_at: self.clock.now(),
            })
            .await?;
        drop(guard);

        tracing::info!(
            loan_id = loan.id,
            user_id = loan.user_id,
            book_id = loan.book_id,
            due_date = %loan.due_date,
            "Loan created"
        );

        self.effects.adjust_inventory(&loan, -1).await;
        self.history
            .record(loan.id, HistoryAction::Created, "Loan created")
            .await;
        self.effects.notify(Notification::new(
            loan.user_id,
            NotificationType::LoanCreated,
            "Loan created",
            format!(
                "Your loan of book {} has been created. Due date: {}",
                loan.book_id, loan.due_date
            ),
            Priority::Medium,
        ));

        Ok(loan)
    }

    /// Get loan by ID
    pub async fn get_loan(&self, loan_id: i64) -> AppResult<Loan> {
        self.repository.loans.get_by_id(loan_id).await
    }

    /// Return a borrowed book, applying the late fine if any
    pub async fn return_loan(&self, loan_id: i64) -> AppResult<Loan> {
        let _guard = self.loan_locks.lock(loan_id).await;
        let mut loan = self.repository.loans.get_by_id(loan_id).await?;

        let fine = lifecycle::return_loan(&mut loan, self.clock.today(), self.config.fine_per_day)?;
        let loan = self.save(loan).await?;

        tracing::info!(loan_id, fine = %fine, "Loan returned");

        self.effects.adjust_inventory(&loan, 1).await;

        let fined = fine > Decimal::ZERO;
        let (notes, message) = if fined {
            (
                format!("Book returned. Fine: ${}", fine),
                format!("You have returned the book. Fine applied: ${}", fine),
            )
        } else {
            (
                "Book returned".to_string(),
                "You have returned the book.".to_string(),
            )
        };
        self.history.record(loan_id, HistoryAction::Returned, notes).await;
        self.effects.notify(Notification::new(
            loan.user_id,
            NotificationType::LoanReturned,
            "Book returned",
            message,
            if fined { Priority::High } else { Priority::Medium },
        ));

        Ok(loan)
    }

    /// Extend the due date of an active loan
    pub async fn extend_loan(&self, loan_id: i64) -> AppResult<Loan> {
        let _guard = self.loan_locks.lock(loan_id).await;
        let mut loan = self.repository.loans.get_by_id(loan_id).await?;

        lifecycle::extend(&mut loan, self.clock.today(), &self.config)?;
        let loan = self.save(loan).await?;

        tracing::info!(
            loan_id,
            due_date = %loan.due_date,
            extensions = loan.extensions_count,
            "Loan extended"
        );

        self.history
            .record(
                loan_id,
                HistoryAction::Extended,
                format!("Loan extended by {} days", self.config.extension_days),
            )
            .await;
        self.effects.notify(Notification::new(
            loan.user_id,
            NotificationType::LoanExtended,
            "Loan extended",
            format!("Your loan has been extended. New due date: {}", loan.due_date),
            Priority::Low,
        ));

        Ok(loan)
    }

    /// Cancel an active loan
    pub async fn cancel_loan(&self, loan_id: i64) -> AppResult<Loan> {
        let _guard = self.loan_locks.lock(loan_id).await;
        let mut loan = self.repository.loans.get_by_id(loan_id).await?;

        lifecycle::cancel(&mut loan)?;
        let loan = self.save(loan).await?;

        tracing::info!(loan_id, "Loan cancelled");

        self.effects.adjust_inventory(&loan, 1).await;
        self.history
            .record(loan_id, HistoryAction::Cancelled, "Loan cancelled")
            .await;
        self.effects.notify(Notification::new(
            loan.user_id,
            NotificationType::LoanCancelled,
            "Loan cancelled",
            format!("Your loan of book {} has been cancelled.", loan.book_id),
            Priority::Medium,
        ));

        Ok(loan)
    }

    /// Flag a late loan as OVERDUE and refresh its fine.
    ///
    /// Loans that are not late are returned unchanged.
    pub async fn mark_overdue(&self, loan_id: i64) -> AppResult<Loan> {
        self.apply_overdue(loan_id).await.map(|(loan, _)| loan)
    }

    /// Open loans past their due date, each refreshed through `mark_overdue`
    pub async fn list_overdue_loans(&self) -> AppResult<Vec<Loan>> {
        let today = self.clock.today();
        let candidates = self.repository.loans.list_overdue(today).await?;

        let mut overdue = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let loan = self.mark_overdue(candidate.id).await?;
            // Returned in the meantime
            if loan.is_overdue(today) {
                overdue.push(loan);
            }
        }

        Ok(overdue)
    }

    /// Fine the loan would owe if it were returned today (nothing is saved)
    pub async fn calculate_fine(&self, loan_id: i64) -> AppResult<FineCalculation> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        let today = self.clock.today();
        let daily_fine_rate = self.config.fine_per_day;

        if !loan.is_overdue(today) {
            return Ok(FineCalculation {
                loan_id,
                days_overdue: 0,
                daily_fine_rate,
                total_fine: Decimal::ZERO,
                message: "The loan is not overdue".to_string(),
            });
        }

        let days_overdue = fines::days_overdue(loan.due_date, today);
        Ok(FineCalculation {
            loan_id,
            days_overdue,
            daily_fine_rate,
            total_fine: fines::compute_fine(loan.due_date, today, daily_fine_rate),
            message: format!("Loan overdue by {} days", days_overdue),
        })
    }

    /// History of a loan, newest first
    pub async fn get_loan_history(&self, loan_id: i64) -> AppResult<Vec<LoanHistory>> {
        self.repository.loans.get_by_id(loan_id).await?;
        self.history.list(loan_id).await
    }

    /// Evaluate the creation rules without creating anything
    pub async fn validate_loan_creation(
        &self,
        request: CreateLoan,
        token: Option<&str>,
    ) -> AppResult<LoanValidation> {
        request.validate()?;
        self.validator
            .validate_creation(request.user_id, request.book_id, request.loan_days, token)
            .await
    }

    /// Loans of a user, optionally restricted to one status
    pub async fn list_user_loans(
        &self,
        user_id: i64,
        status: Option<LoanStatus>,
    ) -> AppResult<Vec<Loan>> {
        self.repository.loans.list_by_user(user_id, status).await
    }

    /// Loans a user still has out (ACTIVE or OVERDUE)
    pub async fn list_open_user_loans(&self, user_id: i64) -> AppResult<Vec<Loan>> {
        self.repository.loans.list_open_by_user(user_id).await
    }

    pub async fn list_book_loans(&self, book_id: i64) -> AppResult<Vec<Loan>> {
        self.repository.loans.list_by_book(book_id).await
    }

    /// Storage round trip used by the readiness probe
    pub async fn check_storage(&self) -> AppResult<()> {
        self.repository.loans.ping().await
    }

    /// The rule set currently configured
    pub fn business_rules(&self) -> BusinessRulesReport {
        let config = &self.config;
        let rule = |name: &str, description: String| RuleDescription {
            name: name.to_string(),
            description,
        };

        let rules = vec![
            rule(
                "Active loan limit",
                format!(
                    "A user cannot hold more than {} active or overdue loans at once",
                    config.max_active_loans
                ),
            ),
            rule(
                "One loan per book",
                "A user cannot borrow a book they already have out".to_string(),
            ),
            rule(
                "Loan length",
                format!(
                    "Loans last between {} and {} days ({} by default)",
                    config.min_days, config.max_days, config.default_days
                ),
            ),
            rule(
                "Book availability",
                "A book needs at least one available copy to be lent".to_string(),
            ),
            rule(
                "Valid user",
                "The borrower must exist and not be blocked".to_string(),
            ),
            rule(
                "Inventory updates",
                "Lending takes one copy, returning or cancelling gives it back".to_string(),
            ),
            rule(
                "Extensions",
                format!(
                    "Up to {} extensions of {} days, only while the loan is active and not overdue",
                    config.max_extensions, config.extension_days
                ),
            ),
            rule(
                "Late fines",
                format!("{} per day past the due date", config.fine_per_day),
            ),
            rule(
                "Allowed transitions",
                "Only active loans can be extended or cancelled, only active or overdue loans can be returned"
                    .to_string(),
            ),
        ];

        BusinessRulesReport {
            summary: format!("{} business rules in force", rules.len()),
            rules,
        }
    }

    /// Mark every late loan overdue and tell its borrower.
    ///
    /// Returns the number of loans processed. A loan that fails is logged and
    /// skipped.
    pub async fn sweep_overdue(&self) -> AppResult<usize> {
        let today = self.clock.today();
        let candidates = self.repository.loans.list_overdue(today).await?;

        let mut processed = 0;
        for candidate in candidates {
            let loan = match self.apply_overdue(candidate.id).await {
                Ok((loan, OverdueOutcome::Marked(_) | OverdueOutcome::Refreshed(_))) => loan,
                Ok((_, OverdueOutcome::NotOverdue)) => continue,
                Err(e) => {
                    tracing::warn!(loan_id = candidate.id, "Overdue sweep skipped loan: {}", e);
                    continue;
                }
            };

            let days = fines::days_overdue(loan.due_date, today);
            self.effects.notify(Notification::new(
                loan.user_id,
                NotificationType::LoanOverdue,
                "Loan overdue",
                format!(
                    "Your loan is {} days overdue. Please return the book as soon as possible.",
                    days
                ),
                Priority::High,
            ));
            processed += 1;
        }

        tracing::info!(processed, "Overdue sweep finished");
        Ok(processed)
    }

    /// Remind borrowers whose ACTIVE loan is due in exactly `days_ahead` days
    pub async fn remind_due_soon(&self, days_ahead: i64) -> AppResult<usize> {
        let due_date = self.clock.today() + Duration::days(days_ahead);
        let loans = self.repository.loans.list_active_due_on(due_date).await?;

        for loan in &loans {
            self.effects.notify(Notification::new(
                loan.user_id,
                NotificationType::LoanDue,
                "Loan due soon",
                format!(
                    "Your loan is due in {} days. Return date: {}",
                    days_ahead, loan.due_date
                ),
                Priority::High,
            ));
        }

        tracing::info!(reminded = loans.len(), %due_date, "Due-soon sweep finished");
        Ok(loans.len())
    }

    async fn apply_overdue(&self, loan_id: i64) -> AppResult<(Loan, OverdueOutcome)> {
        let _guard = self.loan_locks.lock(loan_id).await;
        let mut loan = self.repository.loans.get_by_id(loan_id).await?;
        let previous_fine = loan.fine_amount;

        let outcome = lifecycle::mark_overdue(&mut loan, self.clock.today(), self.config.fine_per_day);
        match outcome {
            OverdueOutcome::NotOverdue => Ok((loan, outcome)),
            OverdueOutcome::Refreshed(fine) if fine == previous_fine => Ok((loan, outcome)),
            OverdueOutcome::Refreshed(_) => Ok((self.save(loan).await?, outcome)),
            OverdueOutcome::Marked(fine) => {
                let loan = self.save(loan).await?;
                tracing::info!(loan_id, fine = %fine, "Loan marked overdue");
                self.history
                    .record(
                        loan_id,
                        HistoryAction::FineApplied,
                        format!("Loan overdue. Fine: ${}", fine),
                    )
                    .await;
                Ok((loan, outcome))
            }
        }
    }

    async fn save(&self, mut loan: Loan) -> AppResult<Loan> {
        loan.updated_at = self.clock.now();
        self.repository.loans.update(&loan).await
    }
}
