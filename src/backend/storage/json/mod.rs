//! # JSON Storage Module
//!
//! File-based storage for the user store: one JSON document mapping
//! usernames to accounts, plus a one-generation rotating backup.
//!
//! ## File layout
//!
//! ```text
//! data/
//! ├── users_data.json          ← primary store
//! └── users_data_backup.json   ← previous generation, written before each save
//! ```
//!
//! ## Features
//!
//! - Atomic saves (temp file + rename) with backup rotation
//! - Backup fallback when the primary document is unreadable or corrupt
//! - Versioned schema upgrades applied once at load time
//! - Human-readable output: 4-space indentation, non-ASCII kept literal

pub mod connection;
pub mod migrations;
pub mod user_repository;

pub use connection::JsonConnection;
pub use user_repository::UserRepository;
