//! Loan history (audit trail) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// What happened to a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Created,
    Returned,
    Extended,
    Cancelled,
    FineApplied,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "CREATED",
            HistoryAction::Returned => "RETURNED",
            HistoryAction::Extended => "EXTENDED",
            HistoryAction::Cancelled => "CANCELLED",
            HistoryAction::FineApplied => "FINE_APPLIED",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(HistoryAction::Created),
            "RETURNED" => Ok(HistoryAction::Returned),
            "EXTENDED" => Ok(HistoryAction::Extended),
            "CANCELLED" => Ok(HistoryAction::Cancelled),
            "FINE_APPLIED" => Ok(HistoryAction::FineApplied),
            other => Err(format!("Unknown history action: {}", other)),
        }
    }
}

super::text_column!(HistoryAction);

/// History entry from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanHistory {
    pub id: i64,
    pub loan_id: i64,
    pub action: HistoryAction,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// History entry to append
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub loan_id: i64,
    pub action: HistoryAction,
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}
