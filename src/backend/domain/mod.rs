//! Domain services and models for the expense tracker.

pub mod account_service;
pub mod commands;
pub mod errors;
pub mod ledger_service;
pub mod models;
pub mod report_service;
pub mod session;
pub mod stats_service;
pub mod validation;

pub use account_service::AccountService;
pub use errors::{AppError, Result};
pub use ledger_service::LedgerService;
pub use report_service::ReportService;
pub use session::Session;
pub use stats_service::StatsService;
