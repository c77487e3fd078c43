use super::import::{snapshot_date_from_path, SnapshotImporter};
use super::series::SnapshotSeries;
use super::SnapshotError;
use crate::config::SnapshotConfig;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A dated snapshot file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub date: NaiveDate,
    pub path: PathBuf,
}

impl SnapshotFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Local folder of `<prefix>YYYY-MM-DD.csv` files written by the scraper or a drive sync.
#[derive(Debug, Clone)]
pub struct SnapshotDirectory {
    folder: PathBuf,
    prefix: String,
}

impl SnapshotDirectory {
    pub fn new(folder: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::new(config.data_folder.clone(), config.file_prefix.clone())
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Dated snapshot files, newest first. A missing folder yields no files.
    pub fn scan(&self) -> Result<Vec<SnapshotFile>, SnapshotError> {
        if !self.folder.exists() {
            warn!(folder = %self.folder.display(), "snapshot folder does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.folder)? {
            let path = entry?.path();
            if !self.matches(&path) {
                continue;
            }
            match snapshot_date_from_path(&path) {
                Some(date) => files.push(SnapshotFile { date, path }),
                None => debug!(path = %path.display(), "skipping snapshot without date"),
            }
        }

        files.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.path.cmp(&a.path)));
        Ok(files)
    }

    pub fn latest(&self) -> Result<Option<SnapshotFile>, SnapshotError> {
        Ok(self.scan()?.into_iter().next())
    }

    pub fn file_for(&self, date: NaiveDate) -> Result<Option<SnapshotFile>, SnapshotError> {
        Ok(self.scan()?.into_iter().find(|file| file.date == date))
    }

    /// Reads every dated file. Unreadable or malformed files are logged and left out.
    pub fn load_series(&self) -> Result<SnapshotSeries, SnapshotError> {
        let files = self.scan()?;
        let mut series = SnapshotSeries::default();
        let mut skipped = 0usize;

        // Oldest first so a same-day duplicate file later in the listing wins.
        for file in files.iter().rev() {
            match SnapshotImporter::from_path(&file.path) {
                Ok(snapshot) => {
                    series.insert(snapshot);
                }
                Err(err) => {
                    skipped += 1;
                    warn!(path = %file.path.display(), error = %err, "excluding snapshot");
                }
            }
        }

        info!(
            folder = %self.folder.display(),
            loaded = series.len(),
            skipped,
            "snapshot series loaded"
        );
        Ok(series)
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        name.starts_with(&self.prefix) && name.ends_with(".csv") && path.is_file()
    }
}
