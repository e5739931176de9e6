pub mod expense;
pub mod user;

pub use expense::{ExpenseRecord, TransportType};
pub use user::{PaymentMethod, UserAccount};
