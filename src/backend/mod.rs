//! # Backend Module
//!
//! Direct, synchronous access to the domain services and storage. There is
//! no IO/REST layer: front ends construct a [`Backend`] and call services
//! on it. All services share one [`JsonConnection`] pointing at the data
//! directory that holds the JSON user store.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

pub mod domain;
pub mod storage;

pub use storage::json::JsonConnection;

/// Main backend struct that orchestrates all services
pub struct Backend {
    pub account_service: domain::AccountService,
    pub ledger_service: domain::LedgerService,
    pub stats_service: domain::StatsService,
    pub report_service: domain::ReportService,
}

impl Backend {
    /// Create a new backend instance with all services over `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let connection = Arc::new(JsonConnection::new(data_dir)?);

        Ok(Backend {
            account_service: domain::AccountService::new(connection.clone()),
            ledger_service: domain::LedgerService::new(connection.clone()),
            stats_service: domain::StatsService::new(),
            report_service: domain::ReportService::new(),
        })
    }
}
