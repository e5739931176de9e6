//! Filesystem location of the JSON user store.

use anyhow::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

const STORE_FILE: &str = "users_data.json";
const BACKUP_FILE: &str = "users_data_backup.json";

/// Points all repositories at one data directory.
#[derive(Debug, Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
}

impl JsonConnection {
    /// Create a connection, creating the data directory if needed.
    pub fn new(base_directory: impl AsRef<Path>) -> Result<Self> {
        let base_directory = base_directory.as_ref().to_path_buf();
        if !base_directory.exists() {
            fs::create_dir_all(&base_directory)?;
            info!("Created data directory {:?}", base_directory);
        }
        Ok(Self { base_directory })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Path of the primary store document.
    pub fn store_path(&self) -> PathBuf {
        self.base_directory.join(STORE_FILE)
    }

    /// Path of the one-generation backup.
    pub fn backup_path(&self) -> PathBuf {
        self.base_directory.join(BACKUP_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_data_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("data").join("store");
        let connection = JsonConnection::new(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(connection.store_path(), nested.join("users_data.json"));
        assert_eq!(connection.backup_path(), nested.join("users_data_backup.json"));
    }
}
