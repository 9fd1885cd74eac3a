//! The session state machine.
//!
//! A [`SessionEngine`] owns the live session: which channel is active, whether
//! the clock is running, the start of the in-progress interval and the
//! committed totals. Every user action goes through one of its methods, so the
//! totals invariants are enforced in one place:
//!
//! - `focus_total_ms` is the sum of all committed focus laps, and
//!   `break_total_ms` the sum of all committed break laps.
//! - Category totals sum to `focus_total_ms`.
//! - At most one interval is in progress.
//!
//! # Transitions
//!
//! ```text
//!            start                switch (focus)
//!   Idle ───────────▶ Running ─────────────────▶ AwaitingLabel
//!    ▲  ◀─────────── │    ▲                          │
//!    │     pause     │    └────── resolve_label ─────┘
//!    │               │ switch (break): commit + flip
//!    └─── reset ─────┴── (from any state) ─────────────
//! ```
//!
//! Actions that are not valid in the current state are ignored rather than
//! reported as errors: they come from duplicate key presses, not bugs.

use std::collections::BTreeMap;

use crate::aggregate::{DailyHistory, DateKey};
use crate::clock::Clock;
use crate::lap::{LapLedger, NewLap};
use crate::types::{Category, Channel, LapId, LapTag};

/// Receives committed focus intervals.
pub trait IntervalSink {
    fn commit_interval(&mut self, date: DateKey, category: &Category, duration_ms: u64);
}

impl IntervalSink for DailyHistory {
    fn commit_interval(&mut self, date: DateKey, category: &Category, duration_ms: u64) {
        self.fold(date, category, duration_ms);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Stopped; `elapsed_ms` is the paused in-progress interval.
    Idle { elapsed_ms: u64 },
    Running { started_at_ms: u64 },
    /// A focus interval was closed by a switch and waits for its label.
    AwaitingLabel { elapsed_ms: u64 },
}

/// A focus commit waiting for the labeling step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLabel {
    pub elapsed_ms: u64,
    pub default_category: Category,
}

/// Result of [`SessionEngine::switch_channel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Not running, or a label is already pending.
    Ignored,
    /// A break interval was committed and the engine now runs on focus.
    Committed(LapId),
    /// The focus interval needs a label before the flip completes.
    AwaitingLabel(PendingLabel),
}

/// Answer from the labeling step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelDecision {
    Save { name: String, category: Category },
    /// Default name and default category.
    Skip,
}

/// Point-in-time view of the session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub running: bool,
    pub active_channel: Channel,
    pub live_elapsed_ms: u64,
    pub focus_total_ms: u64,
    pub break_total_ms: u64,
    /// Committed focus time plus the live interval when focus is active.
    pub focus_display_ms: u64,
    /// Committed break time plus the live interval when break is active.
    pub break_display_ms: u64,
    pub category_totals_ms: BTreeMap<Category, u64>,
    pub pending_label: Option<PendingLabel>,
}

/// Owns the live session and drives the lap ledger and interval sink.
#[derive(Debug)]
pub struct SessionEngine<C, S> {
    clock: C,
    sink: S,
    phase: Phase,
    active_channel: Channel,
    focus_total_ms: u64,
    break_total_ms: u64,
    category_totals_ms: BTreeMap<Category, u64>,
    default_category: Category,
    ledger: LapLedger,
}

impl<C: Clock, S: IntervalSink> SessionEngine<C, S> {
    /// Creates an idle engine on the focus channel.
    pub fn new(clock: C, sink: S, default_category: Category) -> Self {
        let mut category_totals_ms = BTreeMap::new();
        category_totals_ms.insert(default_category.clone(), 0);
        Self {
            clock,
            sink,
            phase: Phase::Idle { elapsed_ms: 0 },
            active_channel: Channel::Focus,
            focus_total_ms: 0,
            break_total_ms: 0,
            category_totals_ms,
            default_category,
            ledger: LapLedger::new(),
        }
    }

    /// Pre-seeds category totals so every known category reports zero.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        for category in categories {
            self.category_totals_ms.entry(category).or_insert(0);
        }
        self
    }

    /// Starts or resumes the in-progress interval.
    ///
    /// Resuming backdates the start by the time already accumulated, so live
    /// elapsed continues from where it was paused.
    pub fn start(&mut self) -> bool {
        let Phase::Idle { elapsed_ms } = self.phase else {
            tracing::debug!(phase = ?self.phase, "start ignored");
            return false;
        };
        let started_at_ms = self.clock.now_ms().saturating_sub(elapsed_ms);
        self.phase = Phase::Running { started_at_ms };
        tracing::debug!(channel = %self.active_channel, elapsed_ms, "started");
        true
    }

    /// Stops the clock without committing the in-progress interval.
    pub fn pause(&mut self) -> bool {
        let Phase::Running { started_at_ms } = self.phase else {
            tracing::debug!(phase = ?self.phase, "pause ignored");
            return false;
        };
        let elapsed_ms = self.clock.now_ms().saturating_sub(started_at_ms);
        self.phase = Phase::Idle { elapsed_ms };
        tracing::debug!(channel = %self.active_channel, elapsed_ms, "paused");
        true
    }

    /// Starts when idle, pauses when running.
    pub fn toggle(&mut self) -> bool {
        match self.phase {
            Phase::Idle { .. } => self.start(),
            Phase::Running { .. } => self.pause(),
            Phase::AwaitingLabel { .. } => false,
        }
    }

    /// Elapsed time of the in-progress interval.
    ///
    /// Always derived from the absolute start timestamp, so sampling it at
    /// any cadence never accumulates drift.
    pub fn live_elapsed_ms(&self) -> u64 {
        match self.phase {
            Phase::Running { started_at_ms } => self.clock.now_ms().saturating_sub(started_at_ms),
            Phase::Idle { elapsed_ms } | Phase::AwaitingLabel { elapsed_ms } => elapsed_ms,
        }
    }

    /// Closes the in-progress interval and flips to the other channel.
    ///
    /// Break intervals are committed on the spot. Focus intervals are held
    /// until [`resolve_label`](Self::resolve_label) supplies a name and
    /// category; the next interval starts at that point.
    pub fn switch_channel(&mut self) -> SwitchOutcome {
        let Phase::Running { started_at_ms } = self.phase else {
            tracing::debug!(phase = ?self.phase, "switch ignored");
            return SwitchOutcome::Ignored;
        };
        let elapsed_ms = self.clock.now_ms().saturating_sub(started_at_ms);

        match self.active_channel {
            Channel::Break => {
                let id = self
                    .ledger
                    .record(NewLap {
                        channel: Channel::Break,
                        name: String::new(),
                        category: LapTag::Break,
                        duration_ms: elapsed_ms,
                    })
                    .id;
                self.break_total_ms = self.break_total_ms.saturating_add(elapsed_ms);
                tracing::debug!(%id, elapsed_ms, "break committed");
                self.flip();
                SwitchOutcome::Committed(id)
            }
            Channel::Focus => {
                self.phase = Phase::AwaitingLabel { elapsed_ms };
                tracing::debug!(elapsed_ms, "focus interval awaiting label");
                SwitchOutcome::AwaitingLabel(PendingLabel {
                    elapsed_ms,
                    default_category: self.default_category.clone(),
                })
            }
        }
    }

    /// Completes a pending focus commit and finishes the channel flip.
    ///
    /// Returns `None` when no label is pending.
    pub fn resolve_label(&mut self, decision: LabelDecision) -> Option<LapId> {
        let Phase::AwaitingLabel { elapsed_ms } = self.phase else {
            tracing::debug!(phase = ?self.phase, "label ignored");
            return None;
        };
        let (name, category) = match decision {
            LabelDecision::Save { name, category } => (name, category),
            LabelDecision::Skip => (String::new(), self.default_category.clone()),
        };

        let id = self
            .ledger
            .record(NewLap {
                channel: Channel::Focus,
                name,
                category: LapTag::Category(category.clone()),
                duration_ms: elapsed_ms,
            })
            .id;
        self.focus_total_ms = self.focus_total_ms.saturating_add(elapsed_ms);
        let slot = self.category_totals_ms.entry(category.clone()).or_insert(0);
        *slot = slot.saturating_add(elapsed_ms);

        let date = self.clock.today();
        self.sink.commit_interval(date, &category, elapsed_ms);
        tracing::debug!(%id, %category, %date, elapsed_ms, "focus committed");

        self.flip();
        Some(id)
    }

    /// Saves the pending focus interval under `name` and `category`.
    pub fn commit_and_label(
        &mut self,
        name: impl Into<String>,
        category: Category,
    ) -> Option<LapId> {
        self.resolve_label(LabelDecision::Save {
            name: name.into(),
            category,
        })
    }

    /// Zeroes the session and clears the ledger. A pending label is dropped
    /// without being recorded.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle { elapsed_ms: 0 };
        self.active_channel = Channel::Focus;
        self.focus_total_ms = 0;
        self.break_total_ms = 0;
        for total in self.category_totals_ms.values_mut() {
            *total = 0;
        }
        self.ledger.clear();
        tracing::debug!("session reset");
    }

    fn flip(&mut self) {
        self.active_channel = self.active_channel.other();
        self.phase = Phase::Running {
            started_at_ms: self.clock.now_ms(),
        };
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let live_elapsed_ms = self.live_elapsed_ms();
        let (focus_live, break_live) = match self.active_channel {
            Channel::Focus => (live_elapsed_ms, 0),
            Channel::Break => (0, live_elapsed_ms),
        };
        SessionSnapshot {
            running: self.is_running(),
            active_channel: self.active_channel,
            live_elapsed_ms,
            focus_total_ms: self.focus_total_ms,
            break_total_ms: self.break_total_ms,
            focus_display_ms: self.focus_total_ms.saturating_add(focus_live),
            break_display_ms: self.break_total_ms.saturating_add(break_live),
            category_totals_ms: self.category_totals_ms.clone(),
            pending_label: self.pending_label(),
        }
    }

    pub const fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub const fn active_channel(&self) -> Channel {
        self.active_channel
    }

    /// Start of the in-progress interval while running.
    pub const fn interval_start_ms(&self) -> Option<u64> {
        match self.phase {
            Phase::Running { started_at_ms } => Some(started_at_ms),
            _ => None,
        }
    }

    pub fn pending_label(&self) -> Option<PendingLabel> {
        match self.phase {
            Phase::AwaitingLabel { elapsed_ms } => Some(PendingLabel {
                elapsed_ms,
                default_category: self.default_category.clone(),
            }),
            _ => None,
        }
    }

    pub const fn focus_total_ms(&self) -> u64 {
        self.focus_total_ms
    }

    pub const fn break_total_ms(&self) -> u64 {
        self.break_total_ms
    }

    pub const fn category_totals(&self) -> &BTreeMap<Category, u64> {
        &self.category_totals_ms
    }

    pub const fn default_category(&self) -> &Category {
        &self.default_category
    }

    pub const fn ledger(&self) -> &LapLedger {
        &self.ledger
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
