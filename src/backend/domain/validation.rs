//! Input validation helpers shared by the account and ledger services.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::backend::domain::errors::{AppError, Result};

/// ASCII `local@domain.tld` shape.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern compiles")
});

/// Reject blank (empty or whitespace-only) required fields.
pub fn require_field(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<()> {
    require_field(username, "username")?;
    if username.trim().chars().count() < 3 {
        return Err(AppError::validation(
            "username must be at least 3 characters",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str, confirmation: &str) -> Result<()> {
    if password.chars().count() < 6 {
        return Err(AppError::validation(
            "password must be at least 6 characters",
        ));
    }
    if password != confirmation {
        return Err(AppError::validation("password confirmation does not match"));
    }
    Ok(())
}

/// Empty emails are allowed; the field is optional.
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Ok(());
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(AppError::validation(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(())
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!("date '{}' must be in YYYY-MM-DD format", raw))
    })
}

pub fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("amount must be greater than zero"));
    }
    Ok(amount)
}
