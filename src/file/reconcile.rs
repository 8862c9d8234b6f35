//! Orphan reconciliation between the blob store and the access records.
//!
//! Uploads and deletes touch two stores without a transaction, so a failure
//! between the two writes leaves one side behind. [`scan`] finds those
//! leftovers and [`repair`] removes them.
//!
//! An upload stores its blob before its record, so a blob without a record
//! is only an orphan once it is older than the grace period. Keys that do
//! not parse as portal keys carry no stamp and are always reported.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::db::{AccessRepository, Database};
use crate::Result;

use super::key::FileKey;
use super::storage::BlobStore;

/// Default minimum age of an orphan blob.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(300);

/// Orphans found by [`scan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanReport {
    /// Blob keys with no access record.
    pub blobs_without_record: Vec<String>,
    /// Record keys whose blob is gone.
    pub records_without_blob: Vec<String>,
}

impl OrphanReport {
    /// Returns true if both stores agree.
    pub fn is_clean(&self) -> bool {
        self.blobs_without_record.is_empty() && self.records_without_blob.is_empty()
    }

    /// Total number of orphans.
    pub fn len(&self) -> usize {
        self.blobs_without_record.len() + self.records_without_blob.len()
    }

    /// Returns true if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.is_clean()
    }
}

/// Outcome of [`repair`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairSummary {
    /// Orphan blobs removed.
    pub blobs_removed: usize,
    /// Orphan records removed.
    pub records_removed: usize,
    /// Orphans that could not be removed.
    pub failed: usize,
}

/// Compare every blob with every access record.
///
/// Blobs stamped less than `grace` ago are left out of
/// `blobs_without_record`.
pub async fn scan(
    db: &Database,
    blobs: &dyn BlobStore,
    grace: Duration,
) -> Result<OrphanReport> {
    // Records first: a record seen here had its blob stored before it, so a
    // concurrent upload can never look like a record without a blob.
    let record_keys: BTreeSet<String> = AccessRepository::new(db.pool())
        .list_all()
        .await?
        .into_iter()
        .map(|record| record.file_key)
        .collect();
    let blob_keys: BTreeSet<String> = blobs
        .list("", None)
        .await?
        .into_iter()
        .map(|entry| entry.key)
        .collect();

    let cutoff = chrono::Utc::now().timestamp_millis() - grace_millis(grace);
    let blobs_without_record = blob_keys
        .difference(&record_keys)
        .filter(|key| match FileKey::parse(key) {
            Some(parsed) if parsed.stamp() > cutoff => {
                debug!(key = %key, "Skipping recent blob without record");
                false
            }
            _ => true,
        })
        .cloned()
        .collect();

    Ok(OrphanReport {
        blobs_without_record,
        records_without_blob: record_keys.difference(&blob_keys).cloned().collect(),
    })
}

fn grace_millis(grace: Duration) -> i64 {
    i64::try_from(grace.as_millis()).unwrap_or(i64::MAX)
}

/// Remove the orphans listed in `report`.
///
/// A blob whose record has appeared since the scan is kept. Individual
/// failures are logged and counted; the pass continues.
pub async fn repair(
    db: &Database,
    blobs: &dyn BlobStore,
    report: &OrphanReport,
) -> RepairSummary {
    let mut summary = RepairSummary::default();
    let repo = AccessRepository::new(db.pool());

    for key in &report.blobs_without_record {
        match repo.get_by_key(key).await {
            Ok(None) => {}
            Ok(Some(_)) => {
                debug!(key = %key, "Blob gained a record since the scan");
                continue;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to re-check orphan blob");
                summary.failed += 1;
                continue;
            }
        }

        match blobs.delete(key).await {
            Ok(()) => {
                info!(key = %key, "Removed orphan blob");
                summary.blobs_removed += 1;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to remove orphan blob");
                summary.failed += 1;
            }
        }
    }

    for key in &report.records_without_blob {
        match repo.delete_by_key(key).await {
            Ok(true) => {
                info!(key = %key, "Removed orphan access record");
                summary.records_removed += 1;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to remove orphan access record");
                summary.failed += 1;
            }
        }
    }

    summary
}
