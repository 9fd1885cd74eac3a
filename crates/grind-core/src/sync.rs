//! Third-party calendar sync.
//!
//! Calendar providers need an OAuth flow with server-side token handling,
//! which this tool does not have. The entry point exists so callers can offer
//! the action and report why it is unavailable.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("calendar sync is not available: {reason}")]
    NotAvailable { reason: &'static str },
}

/// Attempts to connect a calendar provider. Always fails.
pub const fn connect_calendar() -> Result<(), SyncError> {
    Err(SyncError::NotAvailable {
        reason: "OAuth token handling requires a backend server",
    })
}
