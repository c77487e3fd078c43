//! Failure notifications on top of probation reports.
//!
//! The engine never decides whether someone was already told; the ledger is
//! injected here and consulted only by [`ProbationNotifier`].

mod ledger;
mod notice;
mod notifier;

pub use ledger::{
    should_check, InMemoryLedger, JsonFileLedger, NotificationLedger, NotifiedEntry,
    ProcessedSnapshot,
};
pub use notice::FailureNotice;
pub use notifier::{NotificationSink, NotificationSummary, ProbationNotifier, TracingSink};

use std::path::PathBuf;

/// Ledger kind recorded for a failed probation.
pub const PROBATION_FAILED: &str = "failed";

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("failed to access notification history {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("notification history {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("notification ledger unavailable: {0}")]
    Unavailable(String),
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
