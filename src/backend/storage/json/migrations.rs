//! Schema upgrades applied to the raw store document at load time.
//!
//! Loaded documents may predate fields added after the first release, or
//! may hold the simplified front end's record shape. Each numbered step
//! fills one later addition with its default so the typed model can
//! deserialize the document. Every step is idempotent; a current document
//! passes through unchanged.

use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::warn;
use serde_json::{json, Map, Value};

use crate::backend::domain::models::ExpenseRecord;

const TRANSPORT_LABELS: [&str; 6] = [
    "ride-hailing",
    "taxi",
    "metro",
    "bus",
    "private-car",
    "other",
];

const PAYMENT_LABELS: [&str; 5] = ["cash", "card", "e-wallet", "instant-pay", "other"];

/// Upgrade a raw `username -> account` document in place.
pub fn upgrade_store(root: &mut Value) -> Result<()> {
    let Value::Object(users) = root else {
        bail!("store root is not a username -> account mapping");
    };
    for (username, user) in users.iter_mut() {
        let Value::Object(account) = user else {
            bail!("account entry for '{}' is not an object", username);
        };
        upgrade_account(username, account);
    }
    Ok(())
}

fn upgrade_account(username: &str, account: &mut Map<String, Value>) {
    // Step 1: per-user ledger.
    account.entry("expenses").or_insert_with(|| json!([]));
    // Step 2: account-level default payment method.
    account.entry("payment_method").or_insert_with(|| json!("cash"));
    // Step 3: company name.
    account
        .entry("company_name")
        .or_insert_with(|| json!("unspecified"));

    normalize_timestamp_field(account, "created_at", true);

    if let Some(Value::Array(expenses)) = account.get_mut("expenses") {
        expenses.retain_mut(|expense| match expense {
            Value::Object(expense) => upgrade_expense(username, expense),
            _ => {
                warn!("Dropping malformed expense entry for '{}'", username);
                false
            }
        });
    }
}

/// Returns false when the record cannot be salvaged and must be dropped.
fn upgrade_expense(username: &str, expense: &mut Map<String, Value>) -> bool {
    // Step 4: one canonical record shape, shared with the simplified front
    // end ("description" -> notes, "timestamp" -> added_at, "category"
    // folded into notes; unknown labels collapse to "other"/"cash").
    if !expense.contains_key("notes") {
        let description = expense.remove("description").unwrap_or_else(|| json!(""));
        expense.insert("notes".to_string(), description);
    }
    if !expense.contains_key("added_at") {
        if let Some(stamp) = expense.remove("timestamp") {
            expense.insert("added_at".to_string(), stamp);
        }
    }
    normalize_timestamp_field(expense, "added_at", true);
    normalize_timestamp_field(expense, "updated_at", false);

    if let Some(category) = expense
        .remove("category")
        .and_then(|value| value.as_str().map(str::to_owned))
    {
        let notes_empty = expense
            .get("notes")
            .and_then(Value::as_str)
            .map_or(true, str::is_empty);
        if notes_empty {
            expense.insert("notes".to_string(), json!(category));
        }
    }

    expense.entry("from").or_insert_with(|| json!(""));
    expense.entry("to").or_insert_with(|| json!(""));

    let transport_known = expense
        .get("type")
        .and_then(Value::as_str)
        .map_or(false, |label| TRANSPORT_LABELS.contains(&label));
    if !transport_known {
        expense.insert("type".to_string(), json!("other"));
    }

    let payment_known = expense
        .get("payment_method")
        .and_then(Value::as_str)
        .map_or(false, |label| PAYMENT_LABELS.contains(&label));
    if !payment_known {
        expense.insert("payment_method".to_string(), json!("cash"));
    }

    // Step 5: stable record id.
    let id_missing = expense
        .get("id")
        .and_then(Value::as_str)
        .map_or(true, str::is_empty);
    if id_missing {
        expense.insert("id".to_string(), json!(ExpenseRecord::next_id()));
    }

    // Step 6: the typed model guarantees a parseable date and a numeric
    // amount; records that lost either are dropped rather than poisoning
    // the whole load.
    let date_ok = expense
        .get("date")
        .and_then(Value::as_str)
        .map_or(false, |raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
        });
    if !date_ok {
        warn!("Dropping expense with unparseable date for '{}'", username);
        return false;
    }
    if !expense.get("amount").map_or(false, Value::is_number) {
        warn!("Dropping expense with non-numeric amount for '{}'", username);
        return false;
    }

    true
}

/// Bring a timestamp field to RFC 3339. Accepts the legacy
/// `YYYY-MM-DD HH:MM:SS` form (read as UTC); anything else is replaced
/// with now (when required) or removed (when optional).
fn normalize_timestamp_field(object: &mut Map<String, Value>, key: &str, required: bool) {
    let raw = object.get(key).and_then(Value::as_str).map(str::to_owned);
    let normalized = raw.as_deref().and_then(normalize_timestamp);
    match normalized {
        Some(stamp) => {
            object.insert(key.to_string(), json!(stamp));
        }
        None if required => {
            object.insert(key.to_string(), json!(Utc::now().to_rfc3339()));
        }
        None => {
            object.remove(key);
        }
    }
}

fn normalize_timestamp(raw: &str) -> Option<String> {
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return Some(raw.to_string());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_fields_added_after_first_release() {
        let mut document = json!({
            "ahmed123": {
                "name": "Ahmed",
                "password": "abc123",
                "employee_id": "E-100",
                "department": "",
                "email": "",
                "created_at": "2024-05-01 09:30:00"
            }
        });
        upgrade_store(&mut document).unwrap();

        let account = &document["ahmed123"];
        assert_eq!(account["expenses"], json!([]));
        assert_eq!(account["payment_method"], "cash");
        assert_eq!(account["company_name"], "unspecified");
        // legacy timestamp normalized to RFC 3339
        assert!(account["created_at"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_adopts_simplified_front_end_records() {
        let mut document = json!({
            "mona": {
                "name": "Mona",
                "password": "abc123",
                "employee_id": "E-2",
                "created_at": "2024-05-01 09:30:00",
                "expenses": [
                    {
                        "category": "مواصلات",
                        "amount": 30.0,
                        "date": "2025-02-10",
                        "description": "",
                        "timestamp": "2025-02-10 18:00:00"
                    }
                ]
            }
        });
        upgrade_store(&mut document).unwrap();

        let expense = &document["mona"]["expenses"][0];
        assert_eq!(expense["type"], "other");
        assert_eq!(expense["payment_method"], "cash");
        assert_eq!(expense["notes"], "مواصلات");
        assert_eq!(expense["from"], "");
        assert!(expense["added_at"].as_str().unwrap().contains('T'));
        assert!(!expense["id"].as_str().unwrap().is_empty());
        assert!(expense.get("category").is_none());
        assert!(expense.get("timestamp").is_none());
    }

    #[test]
    fn test_drops_records_with_unparseable_dates() {
        let mut document = json!({
            "u": {
                "name": "U",
                "password": "h",
                "employee_id": "1",
                "created_at": "2025-01-01T00:00:00Z",
                "expenses": [
                    { "date": "not-a-date", "from": "a", "to": "b", "type": "taxi", "amount": 5.0 },
                    { "date": "2025-01-15", "from": "a", "to": "b", "type": "taxi", "amount": 5.0 }
                ]
            }
        });
        upgrade_store(&mut document).unwrap();
        assert_eq!(document["u"]["expenses"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_current_document_is_left_alone() {
        let mut document = json!({
            "sara": {
                "name": "Sara",
                "password": "h",
                "employee_id": "E-7",
                "company_name": "Acme",
                "department": "Sales",
                "email": "sara@acme.com",
                "payment_method": "card",
                "created_at": "2025-01-01T00:00:00+00:00",
                "expenses": [
                    {
                        "id": "exp-1-abcd",
                        "date": "2025-03-01",
                        "from": "Home",
                        "to": "Office",
                        "type": "metro",
                        "payment_method": "e-wallet",
                        "amount": 12.5,
                        "notes": "",
                        "receipt": null,
                        "added_at": "2025-03-01T08:00:00+00:00"
                    }
                ]
            }
        });
        let before = document.clone();
        upgrade_store(&mut document).unwrap();
        assert_eq!(document, before);
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let mut document = json!([1, 2, 3]);
        assert!(upgrade_store(&mut document).is_err());
    }
}
