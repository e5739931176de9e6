//! Command inputs consumed by the domain services.

pub mod accounts;
pub mod expenses;
