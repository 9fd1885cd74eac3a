//! Interactive timer session.
//!
//! Reads one command per line and applies it to a [`SessionEngine`]. With a
//! live interval set, a ticker redraws the status line on stderr between
//! commands; it only ever reads snapshots.

use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use grind_core::{
    Clock, IntervalSink, LabelDecision, Lap, SessionEngine, SessionSnapshot, SwitchOutcome,
};
use grind_db::DailyAggregateStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Interval, MissedTickBehavior};

use super::util::format_clock;
use crate::Categories;

const HELP: &str = "\
Commands:
  start | s              start or resume the timer
  pause                  pause without committing the lap
  p | toggle             start when paused, pause when running
  switch | sw            close the lap and switch focus/break
  save <category> [name] label a pending focus lap
  skip                   label a pending focus lap with defaults
  reset | r              clear the session
  status                 show totals
  laps                   list laps, most recent first
  quit | q               save and exit";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Toggle,
    Switch,
    Save { category: String, name: String },
    Skip,
    Reset,
    Status,
    Laps,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".to_string());
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "start" | "s" => Self::Start,
            "pause" => Self::Pause,
            "p" | "toggle" => Self::Toggle,
            "switch" | "sw" => Self::Switch,
            "save" => {
                let Some(category) = words.next() else {
                    return Err("usage: save <category> [name]".to_string());
                };
                Self::Save {
                    category: category.to_string(),
                    name: words.collect::<Vec<_>>().join(" "),
                }
            }
            "skip" => Self::Skip,
            "reset" | "r" => Self::Reset,
            "status" => Self::Status,
            "laps" => Self::Laps,
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(format!("unknown command: {other} (try 'help')")),
        };
        Ok(command)
    }
}

/// Whether the session loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs the session until `quit` or end of input.
///
/// Pending writes are flushed on every exit, including when reading input or
/// writing output fails.
pub async fn run<C, R, W>(
    engine: &mut SessionEngine<C, DailyAggregateStore>,
    categories: &Categories,
    input: R,
    out: &mut W,
    live: Option<Duration>,
) -> Result<()>
where
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let result = session_loop(engine, categories, input, out, live).await;
    engine.sink().flush().await;
    match &result {
        Ok(()) => tracing::debug!(laps = engine.ledger().len(), "session ended"),
        Err(e) => tracing::warn!(error = %e, laps = engine.ledger().len(), "session aborted"),
    }
    result
}

async fn session_loop<C, R, W>(
    engine: &mut SessionEngine<C, DailyAggregateStore>,
    categories: &Categories,
    mut input: R,
    out: &mut W,
    live: Option<Duration>,
) -> Result<()>
where
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Type 'help' for commands.")?;
    out.flush()?;

    let mut ticker = live.map(|period| {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });
    // Survives a tick interrupting a read; partial input stays buffered.
    let mut buf = Vec::new();

    loop {
        tokio::select! {
            read = input.read_until(b'\n', &mut buf) => {
                if read.context("failed to read command")? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if apply(engine, categories, command, out)? == Flow::Quit {
                            break;
                        }
                    }
                    Err(message) => writeln!(out, "{message}")?,
                }
                out.flush()?;
            }
            () = next_tick(ticker.as_mut()) => {
                eprint!("\r{}  ", status_line(&engine.snapshot()));
            }
        }
    }
    Ok(())
}

async fn next_tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Applies one command and writes its feedback.
pub fn apply<C, S, W>(
    engine: &mut SessionEngine<C, S>,
    categories: &Categories,
    command: Command,
    out: &mut W,
) -> Result<Flow>
where
    C: Clock,
    S: IntervalSink,
    W: Write,
{
    match command {
        Command::Start => {
            if engine.start() {
                writeln!(out, "{}", status_line(&engine.snapshot()))?;
            } else {
                write_ignored(engine, out)?;
            }
        }
        Command::Pause => {
            if engine.pause() {
                writeln!(out, "{}", status_line(&engine.snapshot()))?;
            } else {
                write_ignored(engine, out)?;
            }
        }
        Command::Toggle => {
            if engine.toggle() {
                writeln!(out, "{}", status_line(&engine.snapshot()))?;
            } else {
                write_ignored(engine, out)?;
            }
        }
        Command::Switch => match engine.switch_channel() {
            SwitchOutcome::Committed(_) => {
                write_saved(engine, out)?;
            }
            SwitchOutcome::AwaitingLabel(pending) => {
                writeln!(
                    out,
                    "Focus lap {}. Label it: save <category> [name] | skip",
                    format_clock(pending.elapsed_ms)
                )?;
                let names: Vec<&str> = categories.list().iter().map(|c| c.as_str()).collect();
                writeln!(
                    out,
                    "Categories: {} (default {})",
                    names.join(", "),
                    pending.default_category
                )?;
            }
            SwitchOutcome::Ignored => write_ignored(engine, out)?,
        },
        Command::Save { category, name } => {
            if engine.pending_label().is_none() {
                writeln!(out, "Nothing to label.")?;
            } else if let Some(category) = categories.resolve(&category) {
                engine.commit_and_label(name, category.clone());
                write_saved(engine, out)?;
            } else {
                let names: Vec<&str> = categories.list().iter().map(|c| c.as_str()).collect();
                writeln!(
                    out,
                    "Unknown category '{category}'. Choose one of: {}",
                    names.join(", ")
                )?;
            }
        }
        Command::Skip => {
            if engine.resolve_label(LabelDecision::Skip).is_some() {
                write_saved(engine, out)?;
            } else {
                writeln!(out, "Nothing to label.")?;
            }
        }
        Command::Reset => {
            engine.reset();
            writeln!(out, "Session reset.")?;
        }
        Command::Status => write_status(engine, categories, out)?,
        Command::Laps => write_laps(engine.ledger().history(), out)?,
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// One-line summary of the session.
pub fn status_line(snapshot: &SessionSnapshot) -> String {
    let state = if snapshot.pending_label.is_some() {
        "label?"
    } else if snapshot.running {
        "running"
    } else {
        "paused"
    };
    format!(
        "[{} {state}] lap {} | focus {} | break {}",
        snapshot.active_channel.as_str().to_uppercase(),
        format_clock(snapshot.live_elapsed_ms),
        format_clock(snapshot.focus_display_ms),
        format_clock(snapshot.break_display_ms),
    )
}

fn write_ignored<C: Clock, S: IntervalSink, W: Write>(
    engine: &SessionEngine<C, S>,
    out: &mut W,
) -> Result<()> {
    if engine.pending_label().is_some() {
        writeln!(out, "Waiting for a label: save <category> [name] | skip")?;
    } else if engine.is_running() {
        writeln!(out, "Already running.")?;
    } else {
        writeln!(out, "Not running. Type 'start' first.")?;
    }
    Ok(())
}

fn write_saved<C: Clock, S: IntervalSink, W: Write>(
    engine: &SessionEngine<C, S>,
    out: &mut W,
) -> Result<()> {
    if let Some(lap) = engine.ledger().latest() {
        writeln!(
            out,
            "Saved {} [{}] {}",
            lap.name,
            lap.category,
            format_clock(lap.duration_ms)
        )?;
    }
    writeln!(out, "{}", status_line(&engine.snapshot()))?;
    Ok(())
}

fn write_status<C: Clock, S: IntervalSink, W: Write>(
    engine: &SessionEngine<C, S>,
    categories: &Categories,
    out: &mut W,
) -> Result<()> {
    let snapshot = engine.snapshot();
    writeln!(out, "{}", status_line(&snapshot))?;

    let configured = categories.list();
    let extra = snapshot
        .category_totals_ms
        .keys()
        .filter(|c| !configured.contains(c));
    for category in configured.iter().chain(extra) {
        let total = snapshot.category_totals_ms.get(category).copied().unwrap_or(0);
        writeln!(out, "  {:<12}{}", category.as_str(), format_clock(total))?;
    }
    Ok(())
}

fn write_laps<'a, W: Write>(
    laps: impl ExactSizeIterator<Item = &'a Lap>,
    out: &mut W,
) -> Result<()> {
    if laps.len() == 0 {
        writeln!(out, "No laps yet.")?;
        return Ok(());
    }
    writeln!(out, "Laps (most recent first):")?;
    for lap in laps {
        writeln!(
            out,
            "{:>4}  {:<20} {:<10} {}",
            lap.id.to_string(),
            lap.name,
            lap.category.as_str(),
            format_clock(lap.duration_ms)
        )?;
    }
    Ok(())
}
