//! # Storage Module
//!
//! Storage abstraction trait plus the JSON-file implementation. The domain
//! layer only talks to [`traits::UserStorage`], so another backend could be
//! swapped in without touching the services.

pub mod json;
pub mod traits;

pub use traits::UserStorage;
