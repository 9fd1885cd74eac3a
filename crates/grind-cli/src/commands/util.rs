//! Shared formatting for CLI commands.

/// Formats milliseconds as a stopwatch reading, `mm:ss.cc`.
///
/// Minutes keep counting past 99 rather than rolling into hours.
pub fn format_clock(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}

/// Formats milliseconds as an aggregate duration.
/// Returns "Xh Ym" if >= 1 hour, "Xm Ys" otherwise.
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {}s", total_seconds % 60)
    }
}

/// Share of `value` in `total`, rounded to a whole percent.
pub const fn percent(value: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (value.saturating_mul(100) + total / 2) / total
}

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[expect(
    clippy::cast_possible_truncation,
    reason = "filled is clamped to 10 before the cast"
)]
pub fn progress_bar(value: u64, max: u64) -> String {
    if max == 0 {
        return "░".repeat(10);
    }

    let filled = if value > 0 && value.saturating_mul(20) < max {
        1
    } else {
        ((value.saturating_mul(10) + max / 2) / max).min(10) as usize
    };

    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}
