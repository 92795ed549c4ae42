//! Sync service configuration.

use storesight_storage::SnapshotKind;

/// Sync service configuration. The target bucket comes from the S3 client
/// this service is handed.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Seconds between upload cycles
    pub interval_secs: u64,
    /// Days of local day folders to keep
    pub retention_days: u32,
    /// Run the retention prune every N cycles
    pub cleanup_every: u32,
    /// S3 key prefix for customer files
    pub customer_prefix: String,
    /// S3 key prefix for zone-visit files
    pub zone_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            retention_days: 3,
            cleanup_every: 24,
            customer_prefix: "customer/".to_string(),
            zone_prefix: "visit_zone/".to_string(),
        }
    }
}

impl SyncConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            interval_secs: std::env::var("SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            retention_days: std::env::var("SYNC_RETENTION_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            cleanup_every: std::env::var("SYNC_CLEANUP_EVERY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24),
            customer_prefix: normalize_prefix(
                &std::env::var("SYNC_CUSTOMER_PREFIX").unwrap_or_else(|_| "customer/".to_string()),
            ),
            zone_prefix: normalize_prefix(
                &std::env::var("SYNC_ZONE_PREFIX").unwrap_or_else(|_| "visit_zone/".to_string()),
            ),
        }
    }

    /// S3 key for a day file of the given kind.
    pub fn remote_key(&self, kind: SnapshotKind, day: &str) -> String {
        let prefix = match kind {
            SnapshotKind::Customer => &self.customer_prefix,
            SnapshotKind::ZoneVisit => &self.zone_prefix,
        };
        format!("{}{}.json", prefix, day)
    }
}

/// Ensure a prefix carries exactly one trailing slash.
fn normalize_prefix(prefix: &str) -> String {
    format!("{}/", prefix.trim_end_matches('/'))
}
