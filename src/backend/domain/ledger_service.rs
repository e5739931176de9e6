//! Ledger service: mutations on the active session's expense list.
//!
//! Ledger position is the storage order; the stable record id is the
//! handle front ends should address edits and deletes with (resolved to a
//! position via [`LedgerService::position_of`]). Every successful mutation
//! writes the working copy back to the store; a failed save keeps the
//! in-memory state so the caller can retry.

use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

use crate::backend::domain::commands::expenses::{DisplayRow, ExpenseInput};
use crate::backend::domain::errors::{AppError, Result};
use crate::backend::domain::models::ExpenseRecord;
use crate::backend::domain::session::Session;
use crate::backend::domain::validation;
use crate::backend::storage::json::{JsonConnection, UserRepository};
use crate::backend::storage::UserStorage;

#[derive(Clone)]
pub struct LedgerService {
    user_repository: UserRepository,
}

impl LedgerService {
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        let user_repository = UserRepository::new(connection);
        Self { user_repository }
    }

    /// Validate and append one expense at the end of the ledger.
    pub fn append(&self, session: &mut Session, input: ExpenseInput) -> Result<ExpenseRecord> {
        let record = self.build_record(session, input, None)?;
        session.account.expenses.push(record.clone());
        self.persist(session)?;
        info!(
            "Added expense {} for '{}' ({:.2} on {})",
            record.id, session.username, record.amount, record.date
        );
        Ok(record)
    }

    /// Full replace of the record at `index`, keeping its id and
    /// `added_at` and stamping `updated_at`.
    pub fn replace_at(
        &self,
        session: &mut Session,
        index: usize,
        input: ExpenseInput,
    ) -> Result<ExpenseRecord> {
        let len = session.ledger_len();
        let Some(original) = session.account.expenses.get(index) else {
            return Err(AppError::IndexOutOfBounds { index, len });
        };
        let record = self.build_record(session, input, Some(original))?;
        session.account.expenses[index] = record.clone();
        self.persist(session)?;
        info!(
            "Replaced expense {} at index {} for '{}'",
            record.id, index, session.username
        );
        Ok(record)
    }

    /// Delete the record at `index` and return it.
    pub fn remove_at(&self, session: &mut Session, index: usize) -> Result<ExpenseRecord> {
        let len = session.ledger_len();
        if index >= len {
            return Err(AppError::IndexOutOfBounds { index, len });
        }
        let removed = session.account.expenses.remove(index);
        self.persist(session)?;
        info!(
            "Removed expense {} at index {} for '{}'",
            removed.id, index, session.username
        );
        Ok(removed)
    }

    /// Empty the ledger unconditionally and return how many records went.
    pub fn clear_all(&self, session: &mut Session) -> Result<usize> {
        let removed = session.account.expenses.len();
        session.account.expenses.clear();
        self.persist(session)?;
        info!("Cleared {} expenses for '{}'", removed, session.username);
        Ok(removed)
    }

    /// Current ledger position of the record with the given id.
    pub fn position_of(&self, session: &Session, id: &str) -> Option<usize> {
        session
            .account
            .expenses
            .iter()
            .position(|record| record.id == id)
    }

    /// Last-resort recovery: replace the ledger with whatever the display
    /// currently shows. Display rows carry neither ids nor receipt paths,
    /// so rebuilt records get fresh ids and lose their receipt references.
    pub fn rebuild_from_display(
        &self,
        session: &mut Session,
        rows: Vec<DisplayRow>,
    ) -> Result<usize> {
        let now = Utc::now();
        let mut rebuilt = Vec::with_capacity(rows.len());
        for row in rows {
            let date = validation::parse_date(&row.date)?;
            rebuilt.push(ExpenseRecord {
                id: ExpenseRecord::next_id(),
                date,
                from_location: row.from_location,
                to_location: row.to_location,
                transport_type: row.transport_type,
                payment_method: row.payment_method,
                amount: row.amount,
                notes: row.notes,
                receipt_path: None,
                added_at: now,
                updated_at: None,
            });
        }
        let count = rebuilt.len();
        session.account.expenses = rebuilt;
        self.persist(session)?;
        warn!(
            "Rebuilt ledger for '{}' from {} displayed rows; receipt references were not recoverable",
            session.username, count
        );
        Ok(count)
    }

    fn build_record(
        &self,
        session: &Session,
        input: ExpenseInput,
        existing: Option<&ExpenseRecord>,
    ) -> Result<ExpenseRecord> {
        let date = validation::parse_date(&input.date)?;
        let from_location = input.from_location.trim().to_string();
        let to_location = input.to_location.trim().to_string();
        validation::require_field(&from_location, "from location")?;
        validation::require_field(&to_location, "to location")?;
        let amount = validation::validate_amount(input.amount)?;
        let payment_method = input
            .payment_method
            .unwrap_or(session.account.payment_method);
        let now = Utc::now();

        let (id, added_at, updated_at) = match existing {
            Some(original) => (original.id.clone(), original.added_at, Some(now)),
            None => (ExpenseRecord::next_id(), now, None),
        };

        Ok(ExpenseRecord {
            id,
            date,
            from_location,
            to_location,
            transport_type: input.transport_type,
            payment_method,
            amount,
            notes: input.notes.trim().to_string(),
            receipt_path: input.receipt_path,
            added_at,
            updated_at,
        })
    }

    fn persist(&self, session: &Session) -> Result<()> {
        self.user_repository
            .update_user(&session.username, &session.account)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::backend::domain::account_service::AccountService;
    use crate::backend::domain::commands::accounts::RegisterCommand;
    use crate::backend::domain::models::{PaymentMethod, TransportType};
    use crate::backend::domain::stats_service::StatsService;

    fn create_test_session() -> (LedgerService, AccountService, Session, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = Arc::new(JsonConnection::new(temp_dir.path()).unwrap());
        let account_service = AccountService::new(connection.clone());
        account_service
            .register(RegisterCommand {
                username: "ahmed123".to_string(),
                password: "secret1".to_string(),
                confirm_password: "secret1".to_string(),
                name: "Ahmed".to_string(),
                employee_id: "E-1".to_string(),
                company_name: "Acme".to_string(),
                department: String::new(),
                email: String::new(),
            })
            .unwrap();
        let session = account_service.authenticate("ahmed123", "secret1").unwrap();
        (
            LedgerService::new(connection),
            account_service,
            session,
            temp_dir,
        )
    }

    fn taxi_ride(date: &str, amount: f64) -> ExpenseInput {
        ExpenseInput {
            date: date.to_string(),
            from_location: "Home".to_string(),
            to_location: "Office".to_string(),
            transport_type: TransportType::Taxi,
            payment_method: None,
            amount,
            notes: String::new(),
            receipt_path: None,
        }
    }

    #[test]
    fn test_append_assigns_id_and_added_at() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        let record = ledger.append(&mut session, taxi_ride("2025-01-15", 50.0)).unwrap();

        assert_eq!(session.ledger_len(), 1);
        assert!(record.id.starts_with("exp-"));
        assert!(record.updated_at.is_none());
        assert_eq!(record.amount, 50.0);
    }

    #[test]
    fn test_append_uses_account_default_payment_method() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        session.account.payment_method = PaymentMethod::EWallet;

        let record = ledger.append(&mut session, taxi_ride("2025-01-15", 20.0)).unwrap();
        assert_eq!(record.payment_method, PaymentMethod::EWallet);

        let mut explicit = taxi_ride("2025-01-15", 20.0);
        explicit.payment_method = Some(PaymentMethod::Card);
        let record = ledger.append(&mut session, explicit).unwrap();
        assert_eq!(record.payment_method, PaymentMethod::Card);
    }

    #[test]
    fn test_negative_amount_rejected_without_mutation() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        let err = ledger.append(&mut session, taxi_ride("2025-01-15", -5.0)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.ledger_len(), 0);
    }

    #[test]
    fn test_bad_date_rejected_without_mutation() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        let err = ledger.append(&mut session, taxi_ride("15-01-2025", 10.0)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.ledger_len(), 0);
    }

    #[test]
    fn test_replace_preserves_identity_and_stamps_update() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        let original = ledger.append(&mut session, taxi_ride("2025-01-15", 50.0)).unwrap();

        let mut replacement = taxi_ride("2025-01-16", 75.0);
        replacement.notes = "client visit".to_string();
        let updated = ledger.replace_at(&mut session, 0, replacement).unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.added_at, original.added_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.amount, 75.0);
        assert_eq!(session.ledger()[0].notes, "client visit");
    }

    #[test]
    fn test_stale_index_is_an_error_not_a_mutation() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        ledger.append(&mut session, taxi_ride("2025-01-15", 50.0)).unwrap();

        let err = ledger.replace_at(&mut session, 5, taxi_ride("2025-01-16", 1.0)).unwrap_err();
        assert!(matches!(err, AppError::IndexOutOfBounds { index: 5, len: 1 }));

        let err = ledger.remove_at(&mut session, 1).unwrap_err();
        assert!(matches!(err, AppError::IndexOutOfBounds { index: 1, len: 1 }));

        assert_eq!(session.ledger_len(), 1);
        assert_eq!(session.ledger()[0].amount, 50.0);
    }

    #[test]
    fn test_removed_record_leaves_the_totals() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        ledger.append(&mut session, taxi_ride("2025-01-15", 50.0)).unwrap();
        ledger.append(&mut session, taxi_ride("2025-01-16", 30.0)).unwrap();

        let removed = ledger.remove_at(&mut session, 0).unwrap();
        assert_eq!(removed.amount, 50.0);

        let totals = StatsService::new().aggregate(session.ledger());
        assert_eq!(totals.count, 1);
        assert_eq!(totals.total, 30.0);
    }

    #[test]
    fn test_position_of_resolves_ids() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        let first = ledger.append(&mut session, taxi_ride("2025-01-15", 50.0)).unwrap();
        let second = ledger.append(&mut session, taxi_ride("2025-01-16", 30.0)).unwrap();

        assert_eq!(ledger.position_of(&session, &first.id), Some(0));
        assert_eq!(ledger.position_of(&session, &second.id), Some(1));
        assert_eq!(ledger.position_of(&session, "exp-0-none"), None);
    }

    #[test]
    fn test_clear_all_empties_the_ledger() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        ledger.append(&mut session, taxi_ride("2025-01-15", 50.0)).unwrap();
        ledger.append(&mut session, taxi_ride("2025-01-16", 30.0)).unwrap();

        assert_eq!(ledger.clear_all(&mut session).unwrap(), 2);
        assert_eq!(session.ledger_len(), 0);
    }

    #[test]
    fn test_rebuild_from_display_loses_receipts() {
        let (ledger, _accounts, mut session, _temp_dir) = create_test_session();
        let mut with_receipt = taxi_ride("2025-01-15", 50.0);
        with_receipt.receipt_path = Some("/tmp/receipt.png".into());
        ledger.append(&mut session, with_receipt).unwrap();

        let rows = vec![DisplayRow {
            date: "2025-01-15".to_string(),
            from_location: "Home".to_string(),
            to_location: "Office".to_string(),
            transport_type: TransportType::Taxi,
            payment_method: PaymentMethod::Cash,
            amount: 50.0,
            notes: String::new(),
        }];
        ledger.rebuild_from_display(&mut session, rows).unwrap();

        assert_eq!(session.ledger_len(), 1);
        assert!(session.ledger()[0].receipt_path.is_none());
    }

    #[test]
    fn test_mutations_survive_a_fresh_login() {
        let (ledger, accounts, mut session, _temp_dir) = create_test_session();
        ledger.append(&mut session, taxi_ride("2025-01-15", 50.0)).unwrap();

        let reloaded = accounts.authenticate("ahmed123", "secret1").unwrap();
        assert_eq!(reloaded.ledger_len(), 1);
        assert_eq!(reloaded.ledger()[0].amount, 50.0);
    }
}
