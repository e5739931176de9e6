//! Account service: registration, authentication and profile updates.

use chrono::Utc;
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::backend::domain::commands::accounts::{
    RegisterCommand, RegisterResult, UpdateProfileCommand,
};
use crate::backend::domain::errors::{AppError, Result};
use crate::backend::domain::models::{PaymentMethod, UserAccount};
use crate::backend::domain::session::Session;
use crate::backend::domain::validation;
use crate::backend::storage::json::{JsonConnection, UserRepository};
use crate::backend::storage::UserStorage;

/// Service for managing user accounts and credentials.
#[derive(Clone)]
pub struct AccountService {
    user_repository: UserRepository,
}

impl AccountService {
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        let user_repository = UserRepository::new(connection);
        Self { user_repository }
    }

    /// Create a new account with an empty ledger.
    pub fn register(&self, command: RegisterCommand) -> Result<RegisterResult> {
        let username = command.username.trim().to_string();
        let name = command.name.trim().to_string();
        let employee_id = command.employee_id.trim().to_string();
        let company_name = command.company_name.trim().to_string();
        let department = command.department.trim().to_string();
        let email = command.email.trim().to_string();

        validation::require_field(&name, "name")?;
        validation::validate_username(&username)?;
        validation::require_field(&command.password, "password")?;
        validation::require_field(&employee_id, "employee id")?;
        validation::require_field(&company_name, "company name")?;
        validation::validate_password(&command.password, &command.confirm_password)?;
        validation::validate_email(&email)?;

        if self.user_repository.get_user(&username)?.is_some() {
            return Err(AppError::validation(format!(
                "username '{}' is already taken",
                username
            )));
        }

        let account = UserAccount {
            name,
            password_hash: Self::hash_password(&command.password),
            employee_id,
            company_name,
            department,
            email,
            payment_method: PaymentMethod::default(),
            expenses: Vec::new(),
            created_at: Utc::now(),
        };

        self.user_repository.insert_user(&username, &account)?;
        info!("Registered account '{}'", username);

        Ok(RegisterResult { username, account })
    }

    /// Check credentials and hand out a working copy of the account.
    ///
    /// Unknown usernames and wrong passwords fail with distinct errors so
    /// the shell can show distinct messages.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::validation("username and password are required"));
        }

        let account = match self.user_repository.get_user(username)? {
            Some(account) => account,
            None => {
                warn!("Login attempt for unknown username '{}'", username);
                return Err(AppError::UnknownUser(username.to_string()));
            }
        };

        if account.password_hash != Self::hash_password(password) {
            warn!("Wrong password for user '{}'", username);
            return Err(AppError::WrongPassword(username.to_string()));
        }

        info!(
            "User '{}' logged in ({} expenses on ledger)",
            username,
            account.expenses.len()
        );
        Ok(Session::new(username, account))
    }

    /// Replace the profile fields of the session's account and persist.
    /// The ledger and the username are untouched; the password hash is
    /// replaced only when a new password was supplied and confirmed.
    pub fn update_profile(
        &self,
        session: &mut Session,
        command: UpdateProfileCommand,
    ) -> Result<()> {
        let email = command.email.trim().to_string();
        validation::validate_email(&email)?;
        if let Some(new_password) = command.new_password.as_deref() {
            let confirmation = command.confirm_password.as_deref().unwrap_or_default();
            validation::validate_password(new_password, confirmation)?;
        }

        let account = &mut session.account;
        account.name = command.name.trim().to_string();
        account.employee_id = command.employee_id.trim().to_string();
        account.company_name = command.company_name.trim().to_string();
        account.department = command.department.trim().to_string();
        account.email = email;
        account.payment_method = command.payment_method;
        if let Some(new_password) = command.new_password.as_deref() {
            account.password_hash = Self::hash_password(new_password);
        }

        self.user_repository
            .update_user(&session.username, &session.account)?;
        info!("Updated profile for '{}'", session.username);
        Ok(())
    }

    /// Write the session's working copy back to the store. Called on
    /// logout and shutdown; ledger mutations persist on their own.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.user_repository
            .update_user(&session.username, &session.account)?;
        info!("Saved working copy for '{}'", session.username);
        Ok(())
    }

    fn hash_password(password: &str) -> String {
        let digest = Sha256::digest(password.as_bytes());
        digest.iter().map(|byte| format!("{:02x}", byte)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (AccountService, Arc<JsonConnection>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = Arc::new(JsonConnection::new(temp_dir.path()).unwrap());
        (AccountService::new(connection.clone()), connection, temp_dir)
    }

    fn register_command(username: &str, password: &str) -> RegisterCommand {
        RegisterCommand {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
            name: "Ahmed Mahmoud".to_string(),
            employee_id: "E-1042".to_string(),
            company_name: "Acme Logistics".to_string(),
            department: "Operations".to_string(),
            email: "ahmed@acme.com".to_string(),
        }
    }

    #[test]
    fn test_register_then_login() {
        let (service, _conn, _temp_dir) = create_test_service();
        service.register(register_command("ahmed123", "secret1")).unwrap();

        let session = service.authenticate("ahmed123", "secret1").unwrap();
        assert_eq!(session.username, "ahmed123");
        assert_eq!(session.account.name, "Ahmed Mahmoud");
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn test_wrong_password_and_unknown_user_are_distinct() {
        let (service, _conn, _temp_dir) = create_test_service();
        service.register(register_command("ahmed123", "secret1")).unwrap();

        let wrong = service.authenticate("ahmed123", "wrongpass").unwrap_err();
        assert!(matches!(wrong, AppError::WrongPassword(_)));

        let unknown = service.authenticate("nobody", "secret1").unwrap_err();
        assert!(matches!(unknown, AppError::UnknownUser(_)));
    }

    #[test]
    fn test_password_is_never_stored_in_plaintext() {
        let (service, _conn, _temp_dir) = create_test_service();
        let result = service.register(register_command("ahmed123", "secret1")).unwrap();
        assert_ne!(result.account.password_hash, "secret1");
        // SHA-256 hex digest
        assert_eq!(result.account.password_hash.len(), 64);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (service, _conn, _temp_dir) = create_test_service();
        service.register(register_command("ahmed123", "secret1")).unwrap();

        let err = service.register(register_command("ahmed123", "other66")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_registration_validation_rules() {
        let (service, _conn, _temp_dir) = create_test_service();

        let mut short_username = register_command("ab", "secret1");
        short_username.username = "ab".to_string();
        assert!(service.register(short_username).is_err());

        let short_password = register_command("user1", "12345");
        assert!(service.register(short_password).is_err());

        let mut mismatch = register_command("user2", "secret1");
        mismatch.confirm_password = "secret2".to_string();
        assert!(service.register(mismatch).is_err());

        let mut blank_company = register_command("user3", "secret1");
        blank_company.company_name = "  ".to_string();
        assert!(service.register(blank_company).is_err());

        let mut bad_email = register_command("user4", "secret1");
        bad_email.email = "not-an-email".to_string();
        assert!(service.register(bad_email).is_err());

        // email is optional
        let mut no_email = register_command("user5", "secret1");
        no_email.email = String::new();
        assert!(service.register(no_email).is_ok());
    }

    #[test]
    fn test_update_profile_replaces_fields_and_password() {
        let (service, _conn, _temp_dir) = create_test_service();
        service.register(register_command("ahmed123", "secret1")).unwrap();
        let mut session = service.authenticate("ahmed123", "secret1").unwrap();

        let command = UpdateProfileCommand {
            name: "Ahmed M. Mahmoud".to_string(),
            employee_id: "E-1042".to_string(),
            company_name: "Acme Logistics".to_string(),
            department: "Finance".to_string(),
            email: "ahmed.m@acme.com".to_string(),
            payment_method: PaymentMethod::Card,
            new_password: Some("newpass9".to_string()),
            confirm_password: Some("newpass9".to_string()),
        };
        service.update_profile(&mut session, command).unwrap();

        // old password no longer works, new one does
        assert!(matches!(
            service.authenticate("ahmed123", "secret1").unwrap_err(),
            AppError::WrongPassword(_)
        ));
        let session = service.authenticate("ahmed123", "newpass9").unwrap();
        assert_eq!(session.account.department, "Finance");
        assert_eq!(session.account.payment_method, PaymentMethod::Card);
    }

    #[test]
    fn test_non_ascii_profile_survives_reload() {
        let (service, connection, _temp_dir) = create_test_service();
        let mut command = register_command("ahmed123", "secret1");
        command.name = "أحمد محمود".to_string();
        command.company_name = "شركة النقل".to_string();
        service.register(command).unwrap();

        // fresh service over the same data directory, as after a restart
        let reopened = AccountService::new(connection);
        let session = reopened.authenticate("ahmed123", "secret1").unwrap();
        assert_eq!(session.account.name, "أحمد محمود");
        assert_eq!(session.account.company_name, "شركة النقل");
    }
}
