//! Domain model for an expense record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use super::user::PaymentMethod;

/// Means of transport for one trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportType {
    /// App-based services (Uber, Careem and the like).
    #[serde(rename = "ride-hailing")]
    RideHailing,
    #[serde(rename = "taxi")]
    Taxi,
    #[serde(rename = "metro")]
    Metro,
    #[serde(rename = "bus")]
    Bus,
    #[serde(rename = "private-car")]
    PrivateCar,
    #[serde(rename = "other")]
    Other,
}

impl TransportType {
    pub const ALL: [TransportType; 6] = [
        TransportType::RideHailing,
        TransportType::Taxi,
        TransportType::Metro,
        TransportType::Bus,
        TransportType::PrivateCar,
        TransportType::Other,
    ];

    /// Stable label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            TransportType::RideHailing => "ride-hailing",
            TransportType::Taxi => "taxi",
            TransportType::Metro => "metro",
            TransportType::Bus => "bus",
            TransportType::PrivateCar => "private-car",
            TransportType::Other => "other",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransportType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "ride-hailing" => Ok(TransportType::RideHailing),
            "taxi" => Ok(TransportType::Taxi),
            "metro" => Ok(TransportType::Metro),
            "bus" => Ok(TransportType::Bus),
            "private-car" => Ok(TransportType::PrivateCar),
            "other" => Ok(TransportType::Other),
            _ => Err(format!(
                "unknown transport type '{}'; expected one of ride-hailing, taxi, metro, bus, private-car, other",
                raw
            )),
        }
    }
}

/// One trip on a user's ledger.
///
/// Ledger position is insertion order; the `id` is the stable handle for
/// edits and deletes once a display may have re-sorted the rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(default)]
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "from")]
    pub from_location: String,
    #[serde(rename = "to")]
    pub to_location: String,
    #[serde(rename = "type")]
    pub transport_type: TransportType,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub amount: f64,
    #[serde(default)]
    pub notes: String,
    /// Path reference only; the image bytes are never copied, so moving or
    /// deleting the original file silently breaks the link.
    #[serde(rename = "receipt", default)]
    pub receipt_path: Option<PathBuf>,
    pub added_at: DateTime<Utc>,
    /// Set only when the record is edited.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ExpenseRecord {
    /// Generate a record id from a millisecond timestamp.
    /// Format: exp-<timestamp_ms>-<random_suffix>
    /// Example: exp-1736899200123-af3c
    pub fn generate_id(timestamp_ms: u64) -> String {
        format!("exp-{}-{}", timestamp_ms, Self::generate_random_suffix(4))
    }

    /// Generate an id stamped with the current time.
    pub fn next_id() -> String {
        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64;
        Self::generate_id(now_millis)
    }

    /// Lower-cased haystack for the free-text filter: from, to, transport
    /// label and notes.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.from_location,
            self.to_location,
            self.transport_type.label(),
            self.notes
        )
        .to_lowercase()
    }

    pub fn has_receipt(&self) -> bool {
        self.receipt_path.is_some()
    }

    /// Generate a random hex suffix for record ids.
    fn generate_random_suffix(len: usize) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_nanos();
        format!("{:x}", now % (16_u128.pow(len as u32)))
            .chars()
            .take(len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ExpenseRecord {
        ExpenseRecord {
            id: ExpenseRecord::next_id(),
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            from_location: "Home".to_string(),
            to_location: "Office".to_string(),
            transport_type: TransportType::Taxi,
            payment_method: PaymentMethod::Cash,
            amount: 50.0,
            notes: "Morning commute".to_string(),
            receipt_path: None,
            added_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_generate_id_format() {
        let id = ExpenseRecord::generate_id(1736899200123);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "exp");
        assert_eq!(parts[1], "1736899200123");
        assert_eq!(parts[2].len(), 4);
    }

    #[test]
    fn test_searchable_text_is_lowercase() {
        let record = sample_record();
        let haystack = record.searchable_text();
        assert!(haystack.contains("home"));
        assert!(haystack.contains("office"));
        assert!(haystack.contains("taxi"));
        assert!(haystack.contains("morning commute"));
    }

    #[test]
    fn test_transport_type_round_trip() {
        for transport in TransportType::ALL {
            let parsed: TransportType = transport.label().parse().unwrap();
            assert_eq!(parsed, transport);
        }
        assert!("horse".parse::<TransportType>().is_err());
    }

    #[test]
    fn test_date_serializes_in_canonical_form() {
        let record = sample_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2025-01-15");
        assert_eq!(json["from"], "Home");
        assert_eq!(json["type"], "taxi");
        assert_eq!(json["receipt"], serde_json::Value::Null);
    }
}
