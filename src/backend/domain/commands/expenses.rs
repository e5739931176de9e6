//! Commands for ledger mutations.

use std::path::PathBuf;

use crate::backend::domain::models::{PaymentMethod, TransportType};

/// Raw input for appending or fully replacing one expense. The date comes
/// in as entered and is parsed by the service; a missing payment method
/// falls back to the account's default.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub date: String,
    pub from_location: String,
    pub to_location: String,
    pub transport_type: TransportType,
    pub payment_method: Option<PaymentMethod>,
    pub amount: f64,
    pub notes: String,
    pub receipt_path: Option<PathBuf>,
}

/// One row as a display shows it. Used by the rebuild-from-display
/// recovery path; note that displays carry neither record ids nor receipt
/// paths, so a rebuilt ledger loses both.
#[derive(Debug, Clone)]
pub struct DisplayRow {
    pub date: String,
    pub from_location: String,
    pub to_location: String,
    pub transport_type: TransportType,
    pub payment_method: PaymentMethod,
    pub amount: f64,
    pub notes: String,
}
