//! The daily aggregate store.
//!
//! The in-memory [`DailyHistory`] is the source of truth for a running process.
//! Every commit updates it synchronously and then enqueues a full snapshot for
//! a single writer task, which applies writes one at a time in commit order.
//! An older snapshot therefore can never land after a newer one.
//!
//! Persistence is best-effort: failed reads load as an empty history and
//! failed writes are logged and dropped.

use std::sync::Arc;

use grind_core::{Category, DailyHistory, DateKey, IntervalSink};
use tokio::sync::{mpsc, oneshot};

use crate::Persistence;

/// Key the serialized history is stored under.
pub const HISTORY_KEY: &str = "grindsplit-caldata";

enum WriteOp {
    Write(String),
    Flush(oneshot::Sender<()>),
}

/// Per-day focus history with ordered write-back.
#[derive(Debug)]
pub struct DailyAggregateStore {
    history: DailyHistory,
    writes: mpsc::UnboundedSender<WriteOp>,
}

impl DailyAggregateStore {
    /// Loads the persisted history and starts the writer task.
    ///
    /// Must be called within a Tokio runtime.
    pub async fn load(persistence: Arc<dyn Persistence>) -> Self {
        let history = load_history(&*persistence).await;
        let (writes, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(persistence, rx));
        Self { history, writes }
    }

    pub const fn history(&self) -> &DailyHistory {
        &self.history
    }

    /// Folds a focus interval into `date` and schedules a write of the full
    /// history.
    pub fn commit_interval(&mut self, date: DateKey, category: &Category, duration_ms: u64) {
        let day = self.history.fold(date, category, duration_ms);
        tracing::debug!(
            %date,
            %category,
            duration_ms,
            day_total_ms = day.total_ms,
            "interval folded"
        );

        match self.history.to_json() {
            Ok(blob) => {
                if self.writes.send(WriteOp::Write(blob)).is_err() {
                    tracing::warn!("history writer stopped; write dropped");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize history; write dropped"),
        }
    }

    /// Waits until every write enqueued so far has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.writes.send(WriteOp::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

impl IntervalSink for DailyAggregateStore {
    fn commit_interval(&mut self, date: DateKey, category: &Category, duration_ms: u64) {
        Self::commit_interval(self, date, category, duration_ms);
    }
}

/// Reads the persisted history.
///
/// Missing, unreadable and unparseable blobs all yield an empty history.
pub async fn load_history(persistence: &dyn Persistence) -> DailyHistory {
    let blob = match persistence.get(HISTORY_KEY).await {
        Ok(Some(blob)) => blob,
        Ok(None) => return DailyHistory::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read history; starting empty");
            return DailyHistory::new();
        }
    };

    match DailyHistory::from_json(&blob) {
        Ok(history) => {
            tracing::debug!(days = history.len(), "history loaded");
            history
        }
        Err(e) => {
            tracing::warn!(error = %e, "malformed history blob; starting empty");
            DailyHistory::new()
        }
    }
}

async fn write_loop(persistence: Arc<dyn Persistence>, mut rx: mpsc::UnboundedReceiver<WriteOp>) {
    while let Some(op) = rx.recv().await {
        match op {
            WriteOp::Write(blob) => {
                if let Err(e) = persistence.set(HISTORY_KEY, &blob).await {
                    tracing::warn!(error = %e, "failed to persist history; write dropped");
                }
            }
            WriteOp::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("history writer stopped");
}
