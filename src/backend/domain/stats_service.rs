//! Filtering and aggregate statistics over a ledger.
//!
//! Filtering derives a view; it never mutates the source ledger and keeps
//! the original order. "Now" is taken from the local clock by default and
//! can be pinned with [`StatsService::filter_as_of`].

use chrono::{Datelike, Duration, Local, NaiveDate};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::backend::domain::models::ExpenseRecord;

/// Named relative date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    All,
    Today,
    /// From the most recent Monday (inclusive) through today.
    ThisWeek,
    /// Same calendar month and year as today.
    ThisMonth,
    /// Date on or after today minus 30 days.
    Last30Days,
}

impl Period {
    pub fn label(&self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Today => "today",
            Period::ThisWeek => "this-week",
            Period::ThisMonth => "this-month",
            Period::Last30Days => "last-30-days",
        }
    }

    fn includes(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Period::All => true,
            Period::Today => date == today,
            Period::ThisWeek => {
                let week_start =
                    today - Duration::days(today.weekday().num_days_from_monday() as i64);
                date >= week_start && date <= today
            }
            Period::ThisMonth => date.month() == today.month() && date.year() == today.year(),
            Period::Last30Days => date >= today - Duration::days(30),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "all" => Ok(Period::All),
            "today" => Ok(Period::Today),
            "this-week" => Ok(Period::ThisWeek),
            "this-month" => Ok(Period::ThisMonth),
            "last-30-days" => Ok(Period::Last30Days),
            _ => Err(format!(
                "unknown period '{}'; expected one of all, today, this-week, this-month, last-30-days",
                raw
            )),
        }
    }
}

/// Free-text and period predicates, combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub search: String,
    pub period: Period,
}

/// Aggregate figures over a set of records. All zeros when empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedgerTotals {
    pub total: f64,
    pub count: usize,
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

/// Categorical dimension for a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownDimension {
    TransportType,
    PaymentMethod,
}

/// One breakdown group: summed amount and share of the total in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownEntry {
    pub label: String,
    pub amount: f64,
    pub share: f64,
}

/// Stateless filter and aggregation engine.
#[derive(Clone, Default)]
pub struct StatsService;

impl StatsService {
    pub fn new() -> Self {
        Self
    }

    /// Filter against today's date.
    pub fn filter(&self, records: &[ExpenseRecord], filter: &ExpenseFilter) -> Vec<ExpenseRecord> {
        self.filter_as_of(records, filter, Local::now().date_naive())
    }

    /// Filter against an explicit reference date. The search text is a
    /// case-insensitive substring match over from/to/transport/notes; a
    /// record must also fall inside the period window.
    pub fn filter_as_of(
        &self,
        records: &[ExpenseRecord],
        filter: &ExpenseFilter,
        today: NaiveDate,
    ) -> Vec<ExpenseRecord> {
        let needle = filter.search.trim().to_lowercase();
        records
            .iter()
            .filter(|record| needle.is_empty() || record.searchable_text().contains(&needle))
            .filter(|record| filter.period.includes(record.date, today))
            .cloned()
            .collect()
    }

    pub fn aggregate(&self, records: &[ExpenseRecord]) -> LedgerTotals {
        let count = records.len();
        if count == 0 {
            return LedgerTotals::default();
        }
        let total: f64 = records.iter().map(|record| record.amount).sum();
        let max = records
            .iter()
            .map(|record| record.amount)
            .fold(f64::MIN, f64::max);
        let min = records
            .iter()
            .map(|record| record.amount)
            .fold(f64::MAX, f64::min);
        LedgerTotals {
            total,
            count,
            average: total / count as f64,
            max,
            min,
        }
    }

    /// Group amounts by transport type or payment method, descending by
    /// amount (ties broken by label so the output is deterministic).
    pub fn breakdown_by(
        &self,
        records: &[ExpenseRecord],
        dimension: BreakdownDimension,
    ) -> Vec<BreakdownEntry> {
        let total: f64 = records.iter().map(|record| record.amount).sum();
        let mut groups: HashMap<&'static str, f64> = HashMap::new();
        for record in records {
            let label = match dimension {
                BreakdownDimension::TransportType => record.transport_type.label(),
                BreakdownDimension::PaymentMethod => record.payment_method.label(),
            };
            *groups.entry(label).or_insert(0.0) += record.amount;
        }

        let mut entries: Vec<BreakdownEntry> = groups
            .into_iter()
            .map(|(label, amount)| BreakdownEntry {
                label: label.to_string(),
                amount,
                share: if total > 0.0 {
                    amount / total * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        entries.sort_by(|a, b| {
            b.amount
                .partial_cmp(&a.amount)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });
        entries
    }
}
