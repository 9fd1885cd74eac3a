//! Status command for showing storage health and today's total.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use grind_core::DateKey;
use grind_db::{HISTORY_KEY, SqlitePersistence, load_history};

use super::util::format_duration;
use crate::Config;

pub async fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    persistence: &SqlitePersistence,
    today: DateKey,
) -> Result<()> {
    let history = load_history(persistence).await;
    let last_saved = persistence
        .updated_at(HISTORY_KEY)
        .await
        .context("failed to read last save time")?;

    writeln!(writer, "Grind status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Days recorded: {}", history.len())?;

    let today_ms = history.get(today).map_or(0, |day| day.total_ms);
    writeln!(writer, "Today ({today}): {}", format_duration(today_ms))?;

    match last_saved {
        Some(at) => writeln!(
            writer,
            "Last saved: {}",
            at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?,
        None => writeln!(writer, "Last saved: never")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use grind_core::Category;
    use grind_db::DailyAggregateStore;
    use insta::assert_snapshot;

    use super::*;

    fn config(path: &str) -> Config {
        Config {
            database_path: PathBuf::from(path),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn status_on_fresh_database() {
        let db = SqlitePersistence::open_in_memory().unwrap();
        let mut out = Vec::new();
        run(&mut out, &config("/data/grind.db"), &db, "2026-10-16".parse().unwrap())
            .await
            .unwrap();

        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Grind status
        Database: /data/grind.db
        Days recorded: 0
        Today (2026-10-16): 0m 0s
        Last saved: never
        ");
    }

    #[tokio::test]
    async fn status_reports_today_and_last_save() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("grind.db");
        let db = Arc::new(SqlitePersistence::open(&db_path).unwrap());

        let mut store = DailyAggregateStore::load(db.clone()).await;
        let physics = Category::new("Physics").unwrap();
        store.commit_interval("2026-10-15".parse().unwrap(), &physics, 60_000);
        store.commit_interval("2026-10-16".parse().unwrap(), &physics, 5_400_000);
        store.flush().await;

        let mut out = Vec::new();
        run(&mut out, &config("grind.db"), &db, "2026-10-16".parse().unwrap())
            .await
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Days recorded: 2"));
        assert!(out.contains("Today (2026-10-16): 1h 30m"));
        assert!(!out.contains("Last saved: never"));
    }
}
