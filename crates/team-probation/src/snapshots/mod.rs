//! Dated point snapshots and the read-only index the engine runs against.

mod directory;
mod import;
mod series;

pub use directory::{SnapshotDirectory, SnapshotFile};
pub use import::{parse_joined_date, snapshot_date_from_path, SnapshotImporter};
pub use series::{Snapshot, SnapshotSeries};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("snapshot is missing required column '{column}'")]
    MissingColumn { column: &'static str },
    #[error("snapshot file {} carries no YYYY-MM-DD date", .0.display())]
    Undated(PathBuf),
}
