//! The `grind sync` command.

use anyhow::{Context, Result};
use grind_core::sync::connect_calendar;

pub fn run() -> Result<()> {
    connect_calendar()
        .context("cannot sync calendar; run 'grind export' to copy your history instead")
}
