//! The working copy of one authenticated user's account.

use super::models::{ExpenseRecord, UserAccount};

/// Checked out of the store at login and passed explicitly to every
/// operation; there is no ambient "current user". Ledger mutations write
/// the working copy back immediately, and [`crate::backend::domain::AccountService::save_session`]
/// covers the logout/shutdown path.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub account: UserAccount,
}

impl Session {
    pub fn new(username: impl Into<String>, account: UserAccount) -> Self {
        Self {
            username: username.into(),
            account,
        }
    }

    pub fn ledger(&self) -> &[ExpenseRecord] {
        &self.account.expenses
    }

    pub fn ledger_len(&self) -> usize {
        self.account.expenses.len()
    }
}
