//! The upload loop.
//!
//! Every cycle the service walks the local spool, validates each day file,
//! appends its records to the matching S3 day object and deletes the local
//! file once the upload has landed. A file that fails anywhere before the
//! delete stays spooled for the next cycle, so delivery is at-least-once.

use std::time::Duration;

use metrics::counter;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use storesight_storage::{S3Client, SnapshotKind, SnapshotStore};

use crate::config::SyncConfig;
use crate::error::SyncResult;

const SYNC_CYCLES_TOTAL: &str = "storesight_sync_cycles_total";
const SYNC_FAILURES_TOTAL: &str = "storesight_sync_failures_total";
const SYNC_RECORDS_TOTAL: &str = "storesight_sync_records_total";

/// Records shipped in one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub customer_records: usize,
    pub zone_records: usize,
}

impl CycleReport {
    pub fn total(&self) -> usize {
        self.customer_records + self.zone_records
    }
}

/// Background service that ships spooled snapshots to S3.
pub struct SyncService {
    config: SyncConfig,
    store: SnapshotStore,
    s3: S3Client,
}

impl SyncService {
    pub fn new(config: SyncConfig, store: SnapshotStore, s3: S3Client) -> Self {
        Self { config, store, s3 }
    }

    /// Run the upload loop until the shutdown flag flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Sync service started: spool {}, bucket {}, every {}s, keeping {} days",
            self.store.root().display(),
            self.s3.bucket(),
            self.config.interval_secs,
            self.config.retention_days
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        let mut streak = FailureStreak::default();
        let mut cycles_since_cleanup = 0u32;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender also means the server is going away.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, stopping sync service");
                        break;
                    }
                }
                _ = interval.tick() => {
                    counter!(SYNC_CYCLES_TOTAL).increment(1);
                    match self.run_cycle().await {
                        Ok(report) => {
                            if let Some(failures) = streak.record_success() {
                                info!("Sync recovered after {} failed cycles", failures);
                            }
                            if report.customer_records > 0 {
                                counter!(SYNC_RECORDS_TOTAL, "kind" => "customer")
                                    .increment(report.customer_records as u64);
                            }
                            if report.zone_records > 0 {
                                counter!(SYNC_RECORDS_TOTAL, "kind" => "visit_zone")
                                    .increment(report.zone_records as u64);
                            }
                            if report.total() > 0 {
                                info!(
                                    "Synced {} customer and {} zone-visit records",
                                    report.customer_records, report.zone_records
                                );
                            }
                        }
                        Err(e) => {
                            counter!(SYNC_FAILURES_TOTAL).increment(1);
                            if streak.record_failure() {
                                error!("Sync cycle failed: {}", e);
                            } else {
                                debug!(
                                    "Sync cycle failed again ({} consecutive): {}",
                                    streak.count(),
                                    e
                                );
                            }
                        }
                    }

                    cycles_since_cleanup += 1;
                    if cycles_since_cleanup >= self.config.cleanup_every {
                        cycles_since_cleanup = 0;
                        match self.store.prune_older_than(self.config.retention_days).await {
                            Ok(0) => {}
                            Ok(removed) => info!("Pruned {} expired day folders", removed),
                            Err(e) => warn!("Retention prune failed: {}", e),
                        }
                    }
                }
            }
        }
    }

    /// Upload every spooled day file, both kinds. A failure in one kind does
    /// not stop the other; the first error is reported after both ran.
    pub async fn run_cycle(&self) -> SyncResult<CycleReport> {
        let mut report = CycleReport::default();
        let mut first_err = None;

        for kind in SnapshotKind::all() {
            match self.sync_kind(kind).await {
                Ok(count) => match kind {
                    SnapshotKind::Customer => report.customer_records = count,
                    SnapshotKind::ZoneVisit => report.zone_records = count,
                },
                Err(e) => {
                    warn!("Sync of {} files failed: {}", kind.dir_name(), e);
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Ship all spooled day files of one kind. Returns the number of records
    /// appended to S3.
    pub async fn sync_kind(&self, kind: SnapshotKind) -> SyncResult<usize> {
        let mut appended = 0;

        for day in self.store.list_days(kind).await? {
            let body = match self.store.read_day(kind, &day).await? {
                Some(body) => body,
                // Day folder exists but its file was already shipped.
                None => continue,
            };

            let local = match parse_records(&body) {
                Some(records) => records,
                None => {
                    error!("Invalid JSON in {} day {}, discarding", kind.dir_name(), day);
                    self.store.remove_day_file(kind, &day).await?;
                    continue;
                }
            };
            if local.is_empty() {
                continue;
            }

            let key = self.config.remote_key(kind, &day);
            let remote = self.s3.get_object_string(&key).await?;
            let count = local.len();
            let merged = merge_records(remote.as_deref(), local)?;

            let payload = serde_json::to_string_pretty(&Value::Array(merged))?;
            self.s3.put_object_string(&key, payload).await?;

            // Local file goes only once the upload has landed.
            self.store.remove_day_file(kind, &day).await?;

            info!(
                "Appended {} {} records to s3://{}/{}",
                count,
                kind.dir_name(),
                self.s3.bucket(),
                key
            );
            appended += count;
        }

        Ok(appended)
    }
}

/// Parse a spooled day file into its record list. A bare object from an
/// older writer counts as a one-record list. `None` means the JSON is
/// invalid and the file should be discarded.
fn parse_records(body: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => Some(items),
        Ok(other) => Some(vec![other]),
        Err(_) => None,
    }
}

/// Append local records to the remote day list. A missing remote object
/// behaves as an empty list; a bare remote object is wrapped first.
fn merge_records(remote: Option<&str>, local: Vec<Value>) -> SyncResult<Vec<Value>> {
    let mut merged = match remote {
        Some(body) => match serde_json::from_str::<Value>(body)? {
            Value::Array(items) => items,
            other => vec![other],
        },
        None => Vec::new(),
    };
    merged.extend(local);
    Ok(merged)
}

/// Tracks consecutive failures so a flaky link does not flood the log.
#[derive(Debug, Default)]
pub struct FailureStreak {
    consecutive: u32,
}

impl FailureStreak {
    /// Record a failure. Returns `true` only for the first failure of a
    /// streak; repeats should log quietly.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive == 1
    }

    /// Record a success. Returns the length of the streak just ended, if any.
    pub fn record_success(&mut self) -> Option<u32> {
        if self.consecutive == 0 {
            return None;
        }
        let failures = self.consecutive;
        self.consecutive = 0;
        Some(failures)
    }

    pub fn count(&self) -> u32 {
        self.consecutive
    }
}
