//! # Storage Traits
//!
//! This module defines the storage abstraction trait that allows different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::backend::domain::models::UserAccount;

/// Interface for user-account storage.
///
/// The store is small enough to load whole, so every operation works on the
/// full `username -> account` mapping. All operations are synchronous; the
/// process is the sole writer.
pub trait UserStorage: Send + Sync {
    /// Load the full store. Never fails hard: an unusable primary file
    /// falls back to the backup, and an unusable backup yields an empty
    /// store with a warning.
    fn load_store(&self) -> Result<BTreeMap<String, UserAccount>>;

    /// Retrieve one account by username.
    fn get_user(&self, username: &str) -> Result<Option<UserAccount>>;

    /// Store a brand-new account. Fails if the username is already taken.
    fn insert_user(&self, username: &str, account: &UserAccount) -> Result<()>;

    /// Replace an existing account. Fails if the username is unknown.
    fn update_user(&self, username: &str, account: &UserAccount) -> Result<()>;
}
