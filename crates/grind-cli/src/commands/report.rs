//! Report command for monthly study summaries.
//!
//! Implements `grind report [--month YYYY-MM] [--json]` over the stored daily
//! history.

use std::fmt::Write as _;
use std::io;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use grind_core::{Category, DailyHistory, MonthlySummary};
use serde::Serialize;

use super::util::{format_duration, percent, progress_bar};
use crate::Categories;

/// Parses a `YYYY-MM` month argument.
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("invalid month {s:?}, expected YYYY-MM"))?;
    Ok((date.year(), date.month()))
}

/// Formats the human-readable report.
pub fn format_report(summary: &MonthlySummary, categories: &Categories) -> String {
    let mut output = String::new();

    let heading = NaiveDate::from_ymd_opt(summary.year, summary.month, 1).map_or_else(
        || format!("{}-{:02}", summary.year, summary.month),
        |d| d.format("%B %Y").to_string(),
    );
    writeln!(output, "STUDY REPORT: {heading}").unwrap();

    if summary.days.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No study data for this month yet.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'grind run' to start a timer session.").unwrap();
        return output;
    }

    let day_word = if summary.active_days == 1 { "day" } else { "days" };
    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(
        output,
        "Total this month:  {} ({} active {day_word})",
        format_duration(summary.total_ms),
        summary.active_days
    )
    .unwrap();
    writeln!(
        output,
        "Daily average:     {}",
        format_duration(summary.daily_average_ms)
    )
    .unwrap();
    match &summary.best_category {
        Some(best) => writeln!(
            output,
            "Best category:     {} ({})",
            best.category,
            format_duration(best.total_ms)
        )
        .unwrap(),
        None => writeln!(output, "Best category:     none").unwrap(),
    }

    // Configured categories keep their order; categories only found in
    // history (renamed or removed from config) follow alphabetically.
    let configured = categories.list();
    let extra = summary
        .per_category_ms
        .keys()
        .filter(|c| !configured.contains(c));
    let rows: Vec<&Category> = configured.iter().chain(extra).collect();

    writeln!(output).unwrap();
    writeln!(output, "BY CATEGORY").unwrap();
    writeln!(output, "───────────").unwrap();
    for category in rows {
        let ms = summary.per_category_ms.get(category).copied().unwrap_or(0);
        writeln!(
            output,
            "{:<12}{:>8}  {:>3}%  {}",
            category.as_str(),
            format_duration(ms),
            percent(ms, summary.total_ms),
            progress_bar(ms, summary.total_ms)
        )
        .unwrap();
    }

    output
}

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub timezone: String,
    #[serde(flatten)]
    pub summary: &'a MonthlySummary,
}

/// Formats the summary as JSON.
pub fn format_report_json(
    summary: &MonthlySummary,
    generated_at: DateTime<Utc>,
    timezone: String,
) -> Result<String> {
    let report = JsonReport {
        generated_at: generated_at.to_rfc3339(),
        timezone,
        summary,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs the report command.
pub fn run<W: io::Write>(
    writer: &mut W,
    history: &DailyHistory,
    categories: &Categories,
    month: Option<&str>,
    json: bool,
) -> Result<()> {
    let (year, month) = match month {
        Some(s) => parse_month(s)?,
        None => {
            let today = Local::now().date_naive();
            (today.year(), today.month())
        }
    };
    let Some(summary) = MonthlySummary::for_month(history, year, month) else {
        bail!("invalid month {year}-{month:02}");
    };

    if json {
        let timezone = iana_time_zone::get_timezone().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "could not detect timezone");
            "UTC".to_string()
        });
        writeln!(writer, "{}", format_report_json(&summary, Utc::now(), timezone)?)?;
    } else {
        write!(writer, "{}", format_report(&summary, categories))?;
    }
    Ok(())
}
