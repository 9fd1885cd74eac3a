//! Implementation of the `grind export` command.
//!
//! Prints the stored daily history as pretty JSON in the persisted shape, so
//! it can be copied elsewhere or fed back in.

use std::io::Write;

use anyhow::Result;
use grind_core::DailyHistory;

pub fn run<W: Write>(writer: &mut W, history: &DailyHistory) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, history)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use grind_core::Category;

    use super::*;

    #[test]
    fn export_writes_persisted_shape() {
        let mut history = DailyHistory::new();
        let chemistry = Category::new("Chemistry").unwrap();
        history.fold("2026-10-16".parse().unwrap(), &chemistry, 90_000);

        let mut out = Vec::new();
        run(&mut out, &history).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.ends_with("}\n"));
        assert_eq!(DailyHistory::from_json(&out).unwrap(), history);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["2026-10-16"]["subjects"]["Chemistry"], 90_000);
    }

    #[test]
    fn export_empty_history() {
        let mut out = Vec::new();
        run(&mut out, &DailyHistory::new()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{}\n");
    }
}
