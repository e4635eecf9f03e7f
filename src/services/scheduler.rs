//! Periodic loan sweeps

use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{Instant, Interval, MissedTickBehavior},
};

use crate::config::SchedulerConfig;

use super::loans::LoansService;

/// Runs the due-soon reminder and the overdue sweep on a fixed interval
pub struct LoanSweeper {
    loans: LoansService,
    config: SchedulerConfig,
}

/// Counts from one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub reminded: usize,
    pub overdue: usize,
}

impl LoanSweeper {
    pub fn new(loans: LoansService, config: SchedulerConfig) -> Self {
        Self { loans, config }
    }

    /// One pass of both sweeps. A failing sweep is logged and counted as zero.
    pub async fn run_once(&self) -> SweepReport {
        let reminded = self
            .loans
            .remind_due_soon(self.config.due_soon_days)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Due-soon sweep failed: {}", e);
                0
            });

        let overdue = self.loans.sweep_overdue().await.unwrap_or_else(|e| {
            tracing::error!("Overdue sweep failed: {}", e);
            0
        });

        SweepReport { reminded, overdue }
    }

    /// Run a pass once per configured interval.
    ///
    /// The first pass runs one interval after start.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = Duration::from_secs(self.config.interval_secs.max(1));
            let mut interval = ticker(period);

            tracing::info!(interval_secs = period.as_secs(), "Loan sweeper started");

            loop {
                interval.tick().await;
                let report = self.run_once().await;
                tracing::info!(
                    reminded = report.reminded,
                    overdue = report.overdue,
                    "Loan sweep completed"
                );
            }
        })
    }
}

fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clients::{Collaborators, MockBookInventory, MockNotifier, MockUserDirectory},
        clock::FixedClock,
        config::LoanConfig,
        models::{CreateLoan, LoanStatus, NotificationType},
        repository::Repository,
    };
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_run_once_reports_both_sweeps() {
        let mut users = MockUserDirectory::new();
        users.expect_validate().returning(|_, _| Ok(true));
        let mut books = MockBookInventory::new();
        books.expect_is_available().returning(|_| Ok(true));
        books.expect_adjust_copies().returning(|_, _| Ok(()));
        let collaborators = Collaborators {
            users: Arc::new(users),
            books: Arc::new(books),
            notifier: Arc::new(MockNotifier::new()),
        };

        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let loans = LoansService::new(
            Repository::in_memory(),
            &collaborators,
            sender,
            clock.clone(),
            LoanConfig::default(),
        );

        let late = loans
            .create_loan(
                CreateLoan {
                    user_id: 1,
                    book_id: 1,
                    loan_days: Some(7),
                },
                None,
            )
            .await
            .unwrap();
        loans
            .create_loan(
                CreateLoan {
                    user_id: 2,
                    book_id: 2,
                    loan_days: Some(12),
                },
                None,
            )
            .await
            .unwrap();
        while receiver.try_recv().is_ok() {}
        clock.advance_days(10);

        let sweeper = LoanSweeper::new(loans.clone(), SchedulerConfig::default());
        let report = sweeper.run_once().await;

        assert_eq!(report, SweepReport { reminded: 1, overdue: 1 });
        assert_eq!(loans.get_loan(late.id).await.unwrap().status, LoanStatus::Overdue);

        let mut kinds = Vec::new();
        while let Ok(notification) = receiver.try_recv() {
            kinds.push(notification.kind);
        }
        assert_eq!(kinds, vec![NotificationType::LoanDue, NotificationType::LoanOverdue]);
    }

    #[tokio::test]
    async fn test_first_pass_waits_a_full_interval() {
        let mut interval = ticker(Duration::from_secs(3600));

        let early = tokio::time::timeout(Duration::from_millis(50), interval.tick()).await;

        assert!(early.is_err());
    }
}
