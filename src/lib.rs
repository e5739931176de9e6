//! Transportation expense tracker.
//!
//! Accounts with hashed credentials, per-user expense ledgers, text and
//! period filtering with aggregate statistics, and an Excel report export
//! that embeds receipt images. Everything persists to a single JSON store
//! with a rotating backup.

pub mod backend;
