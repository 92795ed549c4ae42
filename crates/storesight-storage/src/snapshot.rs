//! Local snapshot spool.
//!
//! Snapshots wait on disk until the sync service ships them to S3. The
//! layout is one folder per day under each kind:
//!
//! ```text
//! <root>/customer/23082026/23082026.json
//! <root>/customer/23082026/log.txt
//! <root>/visit_zone/23082026/23082026.json
//! <root>/visit_zone/23082026/log.txt
//! ```

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use storesight_models::{parse_day_key, CustomerRecord, ZoneVisitRecord};

use crate::error::StorageResult;

/// The two snapshot families the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// Per-customer demographics and total dwell
    Customer,
    /// Per-customer dwell split by zone
    ZoneVisit,
}

impl SnapshotKind {
    /// Spool directory name for this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            SnapshotKind::Customer => "customer",
            SnapshotKind::ZoneVisit => "visit_zone",
        }
    }

    /// Both kinds, in spool order.
    pub fn all() -> [SnapshotKind; 2] {
        [SnapshotKind::Customer, SnapshotKind::ZoneVisit]
    }
}

/// Local spool of per-day snapshot folders.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at the given spool directory. Nothing is
    /// created on disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Spool root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn day_dir(&self, kind: SnapshotKind, day: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(day)
    }

    fn day_file(&self, kind: SnapshotKind, day: &str) -> PathBuf {
        self.day_dir(kind, day).join(format!("{}.json", day))
    }

    /// Overwrite the customer file for a day with the given records.
    pub async fn write_customer(
        &self,
        day: &str,
        records: &[CustomerRecord],
    ) -> StorageResult<PathBuf> {
        self.write_day(SnapshotKind::Customer, day, records).await
    }

    /// Overwrite the zone-visit file for a day with the given records.
    pub async fn write_zone_visits(
        &self,
        day: &str,
        records: &[ZoneVisitRecord],
    ) -> StorageResult<PathBuf> {
        self.write_day(SnapshotKind::ZoneVisit, day, records).await
    }

    async fn write_day<T: Serialize>(
        &self,
        kind: SnapshotKind,
        day: &str,
        records: &[T],
    ) -> StorageResult<PathBuf> {
        let dir = self.day_dir(kind, day);
        if !dir.exists() {
            tokio::fs::create_dir_all(&dir).await?;
            // The reporting stack expects a log.txt alongside each day file.
            tokio::fs::File::create(dir.join("log.txt")).await?;
            info!("Created snapshot folder {}", dir.display());
        }

        let path = self.day_file(kind, day);
        let tmp = dir.join(format!("{}.json.tmp", day));
        let json = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(path)
    }

    /// Day-folder names present for a kind, sorted. Missing spool roots
    /// read as empty.
    pub async fn list_days(&self, kind: SnapshotKind) -> StorageResult<Vec<String>> {
        let base = self.root.join(kind.dir_name());
        if !base.exists() {
            return Ok(Vec::new());
        }

        let mut days = Vec::new();
        let mut entries = tokio::fs::read_dir(&base).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    days.push(name.to_string());
                }
            }
        }
        days.sort();
        Ok(days)
    }

    /// Read the raw JSON for a day. Returns `None` when no data file exists.
    pub async fn read_day(&self, kind: SnapshotKind, day: &str) -> StorageResult<Option<String>> {
        let path = self.day_file(kind, day);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the data file for a day, leaving the folder and its log.txt in
    /// place. Removing an absent file is not an error.
    pub async fn remove_day_file(&self, kind: SnapshotKind, day: &str) -> StorageResult<()> {
        let path = self.day_file(kind, day);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove day folders older than the retention window, for both kinds.
    /// Folder names that do not parse as day keys are left alone. Returns
    /// the number of folders removed.
    pub async fn prune_older_than(&self, days: u32) -> StorageResult<u32> {
        let cutoff = Local::now().date_naive() - chrono::Duration::days(i64::from(days));
        let mut removed = 0;

        for kind in SnapshotKind::all() {
            for day in self.list_days(kind).await? {
                let parsed = match parse_day_key(&day) {
                    Some(date) => date,
                    None => {
                        warn!("Skipping {} folder with unrecognized name: {}", kind.dir_name(), day);
                        continue;
                    }
                };
                if parsed >= cutoff {
                    continue;
                }

                let dir = self.day_dir(kind, &day);
                match tokio::fs::remove_dir_all(&dir).await {
                    Ok(()) => {
                        info!("Removed expired snapshot folder {}", dir.display());
                        removed += 1;
                    }
                    Err(e) => {
                        error!("Failed to remove {}: {}", dir.display(), e);
                    }
                }
            }
        }

        Ok(removed)
    }
}
