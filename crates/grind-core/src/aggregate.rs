//! Per-day focus history and the monthly read model built on top of it.
//!
//! # Format
//!
//! The history serializes as a single JSON object keyed by local calendar
//! date:
//!
//! ```json
//! {"2026-10-16": {"total": 95000, "subjects": {"Chemistry": 90000, "Physics": 5000}}}
//! ```
//!
//! There is no schema version. Missing fields default to zero, and `total` is
//! rebuilt from the per-category values on load so the two can never disagree.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Category;

/// A local calendar date, formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl std::str::FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Committed focus time for one calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    /// Sum of all per-category values.
    #[serde(rename = "total", default)]
    pub total_ms: u64,

    /// Focus time per category.
    #[serde(rename = "subjects", default)]
    pub per_category_ms: BTreeMap<Category, u64>,
}

impl DailyAggregate {
    fn add(&mut self, category: &Category, duration_ms: u64) {
        let slot = self.per_category_ms.entry(category.clone()).or_insert(0);
        *slot = slot.saturating_add(duration_ms);
        self.total_ms = self.total_ms.saturating_add(duration_ms);
    }

    fn category_sum(&self) -> u64 {
        self.per_category_ms
            .values()
            .fold(0, |acc, ms| acc.saturating_add(*ms))
    }
}

/// The full per-day history, ordered by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyHistory(BTreeMap<DateKey, DailyAggregate>);

impl DailyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a persisted blob, repairing any total that disagrees with its
    /// categories.
    pub fn from_json(blob: &str) -> Result<Self, serde_json::Error> {
        let mut history: Self = serde_json::from_str(blob)?;
        for (date, day) in &mut history.0 {
            let sum = day.category_sum();
            if day.total_ms != sum {
                tracing::debug!(%date, stored = day.total_ms, sum, "repairing daily total");
                day.total_ms = sum;
            }
        }
        Ok(history)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Folds a committed focus interval into `date`, creating the day if needed.
    pub fn fold(
        &mut self,
        date: DateKey,
        category: &Category,
        duration_ms: u64,
    ) -> &DailyAggregate {
        let day = self.0.entry(date).or_default();
        day.add(category, duration_ms);
        day
    }

    pub fn get(&self, date: DateKey) -> Option<&DailyAggregate> {
        self.0.get(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &DailyAggregate)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Days in `[start, end)`.
    fn range(
        &self,
        start: DateKey,
        end: DateKey,
    ) -> impl Iterator<Item = (&DateKey, &DailyAggregate)> {
        self.0.range(start..end)
    }
}

/// Month total for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total_ms: u64,
}

/// Rollup of one calendar month of history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub total_ms: u64,
    /// Days with a recorded aggregate.
    pub active_days: usize,
    /// Mean over active days, zero when there are none.
    pub daily_average_ms: u64,
    /// Category with the largest total; ties go to the alphabetically first.
    pub best_category: Option<CategoryTotal>,
    pub per_category_ms: BTreeMap<Category, u64>,
    pub days: BTreeMap<DateKey, DailyAggregate>,
}

impl MonthlySummary {
    /// Summarizes `year`-`month`. Returns `None` for an invalid month.
    pub fn for_month(history: &DailyHistory, year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        let days: BTreeMap<DateKey, DailyAggregate> = history
            .range(first.into(), next.into())
            .map(|(date, day)| (*date, day.clone()))
            .collect();

        let total_ms = days.values().fold(0u64, |acc, d| acc.saturating_add(d.total_ms));
        let mut per_category_ms: BTreeMap<Category, u64> = BTreeMap::new();
        for day in days.values() {
            for (category, ms) in &day.per_category_ms {
                let slot = per_category_ms.entry(category.clone()).or_insert(0);
                *slot = slot.saturating_add(*ms);
            }
        }

        let active_days = days.len();
        let daily_average_ms = if active_days == 0 {
            0
        } else {
            total_ms / active_days as u64
        };

        // BTreeMap iterates by name, so keeping the first maximum breaks ties alphabetically.
        let best_category = per_category_ms
            .iter()
            .fold(None::<(&Category, u64)>, |best, (category, ms)| match best {
                Some((_, best_ms)) if best_ms >= *ms => best,
                _ => Some((category, *ms)),
            })
            .map(|(category, total_ms)| CategoryTotal {
                category: category.clone(),
                total_ms,
            });

        Some(Self {
            year,
            month,
            total_ms,
            active_days,
            daily_average_ms,
            best_category,
            per_category_ms,
            days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(name: &str) -> Category {
        Category::new(name).unwrap()
    }

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    #[test]
    fn fold_accumulates_same_category() {
        let mut history = DailyHistory::new();
        let date = key("2026-10-16");

        history.fold(date, &cat("Physics"), 5000);
        let day = history.fold(date, &cat("Physics"), 5000);

        assert_eq!(day.per_category_ms[&cat("Physics")], 10_000);
        assert_eq!(day.total_ms, 10_000);
    }

    #[test]
    fn fold_sums_categories_into_total() {
        let mut history = DailyHistory::new();
        let date = key("2026-10-16");

        history.fold(date, &cat("Physics"), 5000);
        history.fold(date, &cat("Chemistry"), 3000);

        let day = history.get(date).unwrap();
        assert_eq!(day.total_ms, 8000);
        assert_eq!(day.per_category_ms.len(), 2);
    }

    #[test]
    fn json_uses_date_keys_and_legacy_field_names() {
        let mut history = DailyHistory::new();
        history.fold(key("2026-10-16"), &cat("Biology"), 1234);

        let json = history.to_json().unwrap();
        assert_eq!(json, r#"{"2026-10-16":{"total":1234,"subjects":{"Biology":1234}}}"#);
        assert_eq!(DailyHistory::from_json(&json).unwrap(), history);
    }

    #[test]
    fn from_json_repairs_inconsistent_totals() {
        let blob = r#"{"2026-10-16":{"total":1,"subjects":{"Physics":700,"Biology":300}}}"#;
        let history = DailyHistory::from_json(blob).unwrap();
        assert_eq!(history.get(key("2026-10-16")).unwrap().total_ms, 1000);
    }

    #[test]
    fn from_json_rejects_foreign_shapes() {
        assert!(DailyHistory::from_json("[1, 2, 3]").is_err());
        assert!(DailyHistory::from_json(r#"{"yesterday":{"total":5}}"#).is_err());
        assert!(DailyHistory::from_json(r#"{"2026-10-16":{"total":-5}}"#).is_err());
    }

    #[test]
    fn monthly_summary_rolls_up_only_that_month() {
        let mut history = DailyHistory::new();
        history.fold(key("2026-09-30"), &cat("Physics"), 60_000);
        history.fold(key("2026-10-01"), &cat("Physics"), 1_000);
        history.fold(key("2026-10-01"), &cat("Chemistry"), 4_000);
        history.fold(key("2026-10-31"), &cat("Physics"), 3_000);
        history.fold(key("2026-11-01"), &cat("Biology"), 60_000);

        let summary = MonthlySummary::for_month(&history, 2026, 10).unwrap();

        assert_eq!(summary.total_ms, 8_000);
        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.daily_average_ms, 4_000);
        assert_eq!(summary.per_category_ms[&cat("Physics")], 4_000);
        assert_eq!(summary.per_category_ms[&cat("Chemistry")], 4_000);
        // Tie on 4000 ms resolves alphabetically.
        assert_eq!(
            summary.best_category,
            Some(CategoryTotal {
                category: cat("Chemistry"),
                total_ms: 4_000
            })
        );
        assert!(!summary.per_category_ms.contains_key(&cat("Biology")));
    }

    #[test]
    fn monthly_summary_handles_december_and_empty_months() {
        let mut history = DailyHistory::new();
        history.fold(key("2026-12-31"), &cat("Physics"), 2_000);

        let december = MonthlySummary::for_month(&history, 2026, 12).unwrap();
        assert_eq!(december.total_ms, 2_000);

        let empty = MonthlySummary::for_month(&history, 2027, 1).unwrap();
        assert_eq!(empty.active_days, 0);
        assert_eq!(empty.daily_average_ms, 0);
        assert!(empty.best_category.is_none());

        assert!(MonthlySummary::for_month(&history, 2026, 13).is_none());
    }
}
