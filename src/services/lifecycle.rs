//! Loan state machine.
//!
//! ACTIVE is the only initial state. ACTIVE may go to OVERDUE, RETURNED or
//! CANCELLED; OVERDUE may only go to RETURNED. RETURNED and CANCELLED are
//! terminal.
//!
//! The functions here only mutate the in-memory [`Loan`]; persisting it and
//! the side effects of a transition are up to the caller. Timestamps
//! (`updated_at`) are left untouched.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    config::LoanConfig,
    error::TransitionError,
    models::{Loan, LoanStatus},
};

use super::fines;

/// Result of an overdue check on a single loan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverdueOutcome {
    /// Not open, or not past its due date
    NotOverdue,
    /// ACTIVE loan moved to OVERDUE with this fine
    Marked(Decimal),
    /// Already OVERDUE, fine recomputed
    Refreshed(Decimal),
}

/// Close a loan that is ACTIVE or OVERDUE.
///
/// Overdue-ness is evaluated before the status flips; the fine (zero when
/// on time) is stored on the loan and returned.
pub fn return_loan(
    loan: &mut Loan,
    today: NaiveDate,
    daily_rate: Decimal,
) -> Result<Decimal, TransitionError> {
    if !loan.status.is_open() {
        return Err(TransitionError::NotReturnable(loan.status));
    }

    let fine = if loan.is_overdue(today) {
        fines::compute_fine(loan.due_date, today, daily_rate)
    } else {
        Decimal::ZERO
    };

    loan.fine_amount = fine;
    loan.return_date = Some(today);
    loan.status = LoanStatus::Returned;

    Ok(fine)
}

/// Push the due date back by one extension period
pub fn extend(loan: &mut Loan, today: NaiveDate, config: &LoanConfig) -> Result<(), TransitionError> {
    if loan.status != LoanStatus::Active {
        return Err(TransitionError::NotExtendable(loan.status));
    }
    if loan.is_overdue(today) {
        return Err(TransitionError::ExtendOverdue);
    }
    if loan.extensions_count >= config.max_extensions {
        return Err(TransitionError::ExtensionLimitReached {
            max: config.max_extensions,
        });
    }

    loan.due_date += Duration::days(i64::from(config.extension_days));
    loan.extensions_count += 1;

    Ok(())
}

pub fn cancel(loan: &mut Loan) -> Result<(), TransitionError> {
    if loan.status != LoanStatus::Active {
        return Err(TransitionError::NotCancellable(loan.status));
    }

    loan.status = LoanStatus::Cancelled;

    Ok(())
}

/// Move a late ACTIVE loan to OVERDUE and (re)compute its fine.
///
/// Already OVERDUE loans keep their status but get the fine recomputed for
/// `today`, so the amount grows with every sweep.
pub fn mark_overdue(loan: &mut Loan, today: NaiveDate, daily_rate: Decimal) -> OverdueOutcome {
    if !loan.is_overdue(today) {
        return OverdueOutcome::NotOverdue;
    }

    let fine = fines::compute_fine(loan.due_date, today, daily_rate);
    loan.fine_amount = fine;

    if loan.status == LoanStatus::Active {
        loan.status = LoanStatus::Overdue;
        OverdueOutcome::Marked(fine)
    } else {
        OverdueOutcome::Refreshed(fine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan_due(due_date: NaiveDate, status: LoanStatus) -> Loan {
        Loan {
            id: 1,
            user_id: 1,
            book_id: 1,
            loan_date: due_date - Duration::days(14),
            due_date,
            return_date: None,
            status,
            loan_days: 14,
            fine_amount: Decimal::ZERO,
            extensions_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rate() -> Decimal {
        Decimal::new(150, 2)
    }

    #[test]
    fn test_return_on_time() {
        let today = day(2024, 1, 20);
        let mut loan = loan_due(day(2024, 1, 29), LoanStatus::Active);

        let fine = return_loan(&mut loan, today, rate()).unwrap();

        assert_eq!(fine, Decimal::ZERO);
        assert_eq!(loan.status, LoanStatus::Returned);
        assert_eq!(loan.return_date, Some(today));
    }

    #[test]
    fn test_return_late_computes_fine_before_closing() {
        let today = day(2024, 2, 3);
        let mut loan = loan_due(day(2024, 1, 29), LoanStatus::Active);

        let fine = return_loan(&mut loan, today, rate()).unwrap();

        assert_eq!(fine, Decimal::new(750, 2));
        assert_eq!(loan.fine_amount, Decimal::new(750, 2));
        assert_eq!(loan.status, LoanStatus::Returned);
        assert!(!loan.is_overdue(today));
    }

    #[test]
    fn test_return_from_overdue() {
        let today = day(2024, 2, 1);
        let mut loan = loan_due(day(2024, 1, 29), LoanStatus::Overdue);

        assert_eq!(return_loan(&mut loan, today, rate()), Ok(Decimal::new(450, 2)));
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let today = day(2024, 1, 20);
        let config = LoanConfig::default();

        for status in [LoanStatus::Returned, LoanStatus::Cancelled] {
            let mut loan = loan_due(day(2024, 1, 29), status);
            let before = loan.clone();

            assert_eq!(
                return_loan(&mut loan, today, rate()),
                Err(TransitionError::NotReturnable(status))
            );
            assert_eq!(
                extend(&mut loan, today, &config),
                Err(TransitionError::NotExtendable(status))
            );
            assert_eq!(cancel(&mut loan), Err(TransitionError::NotCancellable(status)));
            assert_eq!(mark_overdue(&mut loan, day(2024, 3, 1), rate()), OverdueOutcome::NotOverdue);
            assert_eq!(loan, before);
        }
    }

    #[test]
    fn test_extend_twice_then_refuse() {
        let today = day(2024, 1, 15);
        let config = LoanConfig::default();
        let mut loan = loan_due(today + Duration::days(14), LoanStatus::Active);

        extend(&mut loan, today, &config).unwrap();
        assert_eq!(loan.due_date, today + Duration::days(21));
        assert_eq!(loan.extensions_count, 1);

        extend(&mut loan, today, &config).unwrap();
        assert_eq!(loan.due_date, today + Duration::days(28));
        assert_eq!(loan.extensions_count, 2);

        assert_eq!(
            extend(&mut loan, today, &config),
            Err(TransitionError::ExtensionLimitReached { max: 2 })
        );
        assert_eq!(loan.extensions_count, 2);
        assert_eq!(loan.due_date, today + Duration::days(28));
    }

    #[test]
    fn test_extend_refused_when_late() {
        let config = LoanConfig::default();
        let mut loan = loan_due(day(2024, 1, 29), LoanStatus::Active);

        assert_eq!(
            extend(&mut loan, day(2024, 1, 30), &config),
            Err(TransitionError::ExtendOverdue)
        );

        let mut loan = loan_due(day(2024, 1, 29), LoanStatus::Overdue);
        assert_eq!(
            extend(&mut loan, day(2024, 1, 30), &config),
            Err(TransitionError::NotExtendable(LoanStatus::Overdue))
        );
    }

    #[test]
    fn test_extend_on_due_date_is_allowed() {
        let due = day(2024, 1, 29);
        let mut loan = loan_due(due, LoanStatus::Active);

        extend(&mut loan, due, &LoanConfig::default()).unwrap();
        assert_eq!(loan.due_date, day(2024, 2, 5));
    }

    #[test]
    fn test_cancel_only_active() {
        let mut loan = loan_due(day(2024, 1, 29), LoanStatus::Active);
        cancel(&mut loan).unwrap();
        assert_eq!(loan.status, LoanStatus::Cancelled);
        assert_eq!(loan.return_date, None);

        let mut loan = loan_due(day(2024, 1, 29), LoanStatus::Overdue);
        assert_eq!(
            cancel(&mut loan),
            Err(TransitionError::NotCancellable(LoanStatus::Overdue))
        );
    }

    #[test]
    fn test_mark_overdue_then_refresh() {
        let due = day(2024, 1, 29);
        let mut loan = loan_due(due, LoanStatus::Active);

        assert_eq!(mark_overdue(&mut loan, due, rate()), OverdueOutcome::NotOverdue);
        assert_eq!(loan.status, LoanStatus::Active);

        assert_eq!(
            mark_overdue(&mut loan, day(2024, 1, 31), rate()),
            OverdueOutcome::Marked(Decimal::new(300, 2))
        );
        assert_eq!(loan.status, LoanStatus::Overdue);

        assert_eq!(
            mark_overdue(&mut loan, day(2024, 2, 1), rate()),
            OverdueOutcome::Refreshed(Decimal::new(450, 2))
        );
        assert_eq!(loan.status, LoanStatus::Overdue);
        assert_eq!(loan.fine_amount, Decimal::new(450, 2));
    }
}
