//! Overdue fine computation

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Whole days between the due date and `as_of`, zero when not late
pub fn days_overdue(due_date: NaiveDate, as_of: NaiveDate) -> i64 {
    (as_of - due_date).num_days().max(0)
}

/// Fine owed on `as_of` for a loan due on `due_date`.
///
/// Zero on or before the due date, otherwise `daily_rate` per day late.
/// The amount only depends on the two dates and the rate, so it keeps
/// growing until the loan is closed.
pub fn compute_fine(due_date: NaiveDate, as_of: NaiveDate, daily_rate: Decimal) -> Decimal {
    let days = days_overdue(due_date, as_of);
    if days == 0 {
        return Decimal::ZERO;
    }
    (daily_rate * Decimal::from(days)).max(Decimal::ZERO)
}
