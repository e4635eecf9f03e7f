//! Library Loans Service
//!
//! Loan lifecycle engine for the library system: creation rules, the loan
//! state machine, late fines, the loan audit trail and the periodic overdue
//! sweep, exposed as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod clients;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
