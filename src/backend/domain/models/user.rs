//! Domain model for a user account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::expense::ExpenseRecord;

/// How an expense was paid for. Doubles as the account-level default that
/// pre-fills new expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "e-wallet")]
    EWallet,
    #[serde(rename = "instant-pay")]
    InstantPay,
    #[serde(rename = "other")]
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::EWallet,
        PaymentMethod::InstantPay,
        PaymentMethod::Other,
    ];

    /// Stable label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::EWallet => "e-wallet",
            PaymentMethod::InstantPay => "instant-pay",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "e-wallet" => Ok(PaymentMethod::EWallet),
            "instant-pay" => Ok(PaymentMethod::InstantPay),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(format!(
                "unknown payment method '{}'; expected one of cash, card, e-wallet, instant-pay, other",
                raw
            )),
        }
    }
}

/// One registered user. The username is the store key, not a field here:
/// the persisted document is a `username -> account` mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub name: String,
    /// SHA-256 hex digest of the password; the plaintext is never stored.
    #[serde(rename = "password")]
    pub password_hash: String,
    pub employee_id: String,
    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub email: String,
    /// Default payment method used to pre-fill new expenses.
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// The ledger: insertion order is entry order, never re-sorted.
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    pub created_at: DateTime<Utc>,
}

fn default_company_name() -> String {
    "unspecified".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_round_trip() {
        for method in PaymentMethod::ALL {
            let parsed: PaymentMethod = method.label().parse().unwrap();
            assert_eq!(parsed, method);
        }
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_parse_is_lenient_about_case() {
        assert_eq!("  Cash ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("E-WALLET".parse::<PaymentMethod>().unwrap(), PaymentMethod::EWallet);
    }

    #[test]
    fn test_default_payment_method_is_cash() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }
}
