//! Core domain logic for the study split timer.
//!
//! This crate contains the fundamental types and logic for:
//! - Session: the focus/break state machine and its committed totals
//! - Laps: the append-only ledger of committed intervals
//! - Aggregates: per-day focus history and monthly rollups

pub mod aggregate;
pub mod clock;
pub mod lap;
pub mod session;
pub mod sync;
pub mod types;

pub use aggregate::{CategoryTotal, DailyAggregate, DailyHistory, DateKey, MonthlySummary};
pub use clock::{Clock, ManualClock, SystemClock};
pub use lap::{Lap, LapLedger, NewLap};
pub use session::{
    IntervalSink, LabelDecision, PendingLabel, SessionEngine, SessionSnapshot, SwitchOutcome,
};
pub use types::{BREAK_TAG, Category, Channel, LapId, LapTag, ValidationError};
