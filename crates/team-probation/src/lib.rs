//! Probation milestone and post-probation compliance tracking for a render
//! farm team, driven by daily point snapshots.

pub mod config;
pub mod deltas;
pub mod error;
pub mod notifications;
pub mod probation;
pub mod snapshots;
pub mod telemetry;
