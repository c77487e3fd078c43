use super::NotificationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Record of the last snapshot a notification run went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedSnapshot {
    pub snapshot: String,
    pub processed_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifiedEntry {
    pub member: String,
    pub kind: String,
    pub notified_on: NaiveDate,
}

/// "Already notified" lookup consulted before anything is delivered.
pub trait NotificationLedger: Send + Sync {
    fn has_been_notified(&self, member: &str, kind: &str) -> Result<bool, NotificationError>;
    fn mark_notified(
        &self,
        member: &str,
        kind: &str,
        on: NaiveDate,
    ) -> Result<(), NotificationError>;
    fn last_processed(&self) -> Result<Option<ProcessedSnapshot>, NotificationError>;
    fn record_processed(&self, snapshot: &str, on: NaiveDate) -> Result<(), NotificationError>;
}

/// True when `snapshot` has not been processed yet, or was last processed
/// on a different day.
pub fn should_check<L>(
    ledger: &L,
    snapshot: &str,
    today: NaiveDate,
) -> Result<bool, NotificationError>
where
    L: NotificationLedger + ?Sized,
{
    let due = match ledger.last_processed()? {
        None => true,
        Some(previous) => previous.snapshot != snapshot || previous.processed_on != today,
    };
    if !due {
        debug!(snapshot, %today, "snapshot already processed today");
    }
    Ok(due)
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LedgerState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_processed: Option<ProcessedSnapshot>,
    #[serde(default)]
    notified: BTreeMap<String, NotifiedEntry>,
}

impl LedgerState {
    fn key(member: &str, kind: &str) -> String {
        format!("{member}_{kind}")
    }

    fn contains(&self, member: &str, kind: &str) -> bool {
        self.notified.contains_key(&Self::key(member, kind))
    }

    fn mark(&mut self, member: &str, kind: &str, on: NaiveDate) {
        self.notified.insert(
            Self::key(member, kind),
            NotifiedEntry {
                member: member.to_string(),
                kind: kind.to_string(),
                notified_on: on,
            },
        );
    }
}

fn lock(state: &Mutex<LedgerState>) -> Result<MutexGuard<'_, LedgerState>, NotificationError> {
    state
        .lock()
        .map_err(|_| NotificationError::Unavailable("ledger mutex poisoned".to_string()))
}

/// Ledger kept in memory only; used by tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationLedger for InMemoryLedger {
    fn has_been_notified(&self, member: &str, kind: &str) -> Result<bool, NotificationError> {
        Ok(lock(&self.state)?.contains(member, kind))
    }

    fn mark_notified(
        &self,
        member: &str,
        kind: &str,
        on: NaiveDate,
    ) -> Result<(), NotificationError> {
        lock(&self.state)?.mark(member, kind, on);
        Ok(())
    }

    fn last_processed(&self) -> Result<Option<ProcessedSnapshot>, NotificationError> {
        Ok(lock(&self.state)?.last_processed.clone())
    }

    fn record_processed(&self, snapshot: &str, on: NaiveDate) -> Result<(), NotificationError> {
        lock(&self.state)?.last_processed = Some(ProcessedSnapshot {
            snapshot: snapshot.to_string(),
            processed_on: on,
        });
        Ok(())
    }
}

/// Ledger persisted as pretty-printed JSON, rewritten after every change.
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    state: Mutex<LedgerState>,
}

impl JsonFileLedger {
    /// Opens the ledger at `path`; a missing file starts an empty history.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, NotificationError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => LedgerState::default(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                NotificationError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "notification history not found; starting empty");
                LedgerState::default()
            }
            Err(source) => return Err(NotificationError::Io { path, source }),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &LedgerState) -> Result<(), NotificationError> {
        let contents = serde_json::to_string_pretty(state).map_err(|source| {
            NotificationError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| NotificationError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, contents).map_err(|source| NotificationError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl NotificationLedger for JsonFileLedger {
    fn has_been_notified(&self, member: &str, kind: &str) -> Result<bool, NotificationError> {
        Ok(lock(&self.state)?.contains(member, kind))
    }

    fn mark_notified(
        &self,
        member: &str,
        kind: &str,
        on: NaiveDate,
    ) -> Result<(), NotificationError> {
        let mut state = lock(&self.state)?;
        state.mark(member, kind, on);
        self.persist(&state)
    }

    fn last_processed(&self) -> Result<Option<ProcessedSnapshot>, NotificationError> {
        Ok(lock(&self.state)?.last_processed.clone())
    }

    fn record_processed(&self, snapshot: &str, on: NaiveDate) -> Result<(), NotificationError> {
        let mut state = lock(&self.state)?;
        state.last_processed = Some(ProcessedSnapshot {
            snapshot: snapshot.to_string(),
            processed_on: on,
        });
        self.persist(&state)
    }
}
