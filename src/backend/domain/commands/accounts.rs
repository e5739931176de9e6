//! Commands for registration and profile updates.

use crate::backend::domain::models::{PaymentMethod, UserAccount};

#[derive(Debug, Clone, Default)]
pub struct RegisterCommand {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub employee_id: String,
    pub company_name: String,
    pub department: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct RegisterResult {
    pub username: String,
    pub account: UserAccount,
}

/// Full profile replacement. The username itself is never changed; the
/// password hash is replaced only when a new password is supplied.
#[derive(Debug, Clone)]
pub struct UpdateProfileCommand {
    pub name: String,
    pub employee_id: String,
    pub company_name: String,
    pub department: String,
    pub email: String,
    pub payment_method: PaymentMethod,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}
