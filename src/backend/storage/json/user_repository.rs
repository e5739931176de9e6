//! JSON-file-backed user store with a rotating one-generation backup.

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::connection::JsonConnection;
use super::migrations;
use crate::backend::domain::models::UserAccount;
use crate::backend::storage::traits::UserStorage;

/// JSON-based user repository.
///
/// The store is small; every operation loads the whole document, mutates
/// it and saves it back. The process is assumed to be the sole writer.
#[derive(Clone)]
pub struct UserRepository {
    connection: Arc<JsonConnection>,
}

impl UserRepository {
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        Self { connection }
    }

    fn read_store_file(&self, path: &Path) -> Result<BTreeMap<String, UserAccount>> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {:?}", path))?;
        let mut document: Value = serde_json::from_str(&text)
            .with_context(|| format!("{:?} is not valid JSON", path))?;
        migrations::upgrade_store(&mut document)?;
        let store = serde_json::from_value(document)
            .with_context(|| format!("{:?} does not match the store schema", path))?;
        Ok(store)
    }

    /// Write the full store: rotate the previous generation to the backup
    /// file, then stage the new document and rename it into place.
    pub fn save_store(&self, store: &BTreeMap<String, UserAccount>) -> Result<()> {
        let store_path = self.connection.store_path();
        let backup_path = self.connection.backup_path();

        if store_path.exists() {
            fs::copy(&store_path, &backup_path).with_context(|| {
                format!("failed to back up {:?} to {:?}", store_path, backup_path)
            })?;
        }

        // 4-space pretty output; serde_json leaves non-ASCII unescaped.
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        store
            .serialize(&mut serializer)
            .context("failed to serialize the user store")?;
        buffer.push(b'\n');

        let staging = store_path.with_extension("json.tmp");
        fs::write(&staging, &buffer)
            .with_context(|| format!("failed to write {:?}", staging))?;
        fs::rename(&staging, &store_path)
            .with_context(|| format!("failed to move {:?} into place", staging))?;

        debug!("Saved {} accounts to {:?}", store.len(), store_path);
        Ok(())
    }
}

impl UserStorage for UserRepository {
    fn load_store(&self) -> Result<BTreeMap<String, UserAccount>> {
        let store_path = self.connection.store_path();
        if !store_path.exists() {
            debug!("No store at {:?}; starting empty", store_path);
            return Ok(BTreeMap::new());
        }

        match self.read_store_file(&store_path) {
            Ok(store) => Ok(store),
            Err(primary_error) => {
                warn!(
                    "Primary store {:?} is unusable ({:#}); trying backup",
                    store_path, primary_error
                );
                let backup_path = self.connection.backup_path();
                if !backup_path.exists() {
                    warn!("No backup store either; starting empty");
                    return Ok(BTreeMap::new());
                }
                match self.read_store_file(&backup_path) {
                    Ok(store) => {
                        warn!(
                            "Recovered {} accounts from backup {:?}",
                            store.len(),
                            backup_path
                        );
                        Ok(store)
                    }
                    Err(backup_error) => {
                        warn!(
                            "Backup store {:?} is also unusable ({:#}); starting empty",
                            backup_path, backup_error
                        );
                        Ok(BTreeMap::new())
                    }
                }
            }
        }
    }

    fn get_user(&self, username: &str) -> Result<Option<UserAccount>> {
        Ok(self.load_store()?.remove(username))
    }

    fn insert_user(&self, username: &str, account: &UserAccount) -> Result<()> {
        let mut store = self.load_store()?;
        if store.contains_key(username) {
            return Err(anyhow!("username '{}' already exists in the store", username));
        }
        store.insert(username.to_string(), account.clone());
        self.save_store(&store)
    }

    fn update_user(&self, username: &str, account: &UserAccount) -> Result<()> {
        let mut store = self.load_store()?;
        if !store.contains_key(username) {
            return Err(anyhow!("username '{}' does not exist in the store", username));
        }
        store.insert(username.to_string(), account.clone());
        self.save_store(&store)
    }
}
