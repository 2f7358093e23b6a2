use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::constants::{SNAPSHOT_KEY, SNAPSHOT_SCHEMA_VERSION, SNAPSHOT_TTL_HOURS};
use crate::cache::kv::KeyValueStore;
use crate::types::Document;

/// The cached document set together with the commit it was fetched at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub documents: Vec<Document>,
    /// `None` when the commit lookup failed at fetch time; such a snapshot
    /// never matches a later commit id
    pub commit_id: Option<String>,
    pub stored_at: DateTime<Utc>,
}

/// On-disk layout of a snapshot
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    schema_version: u32,
    #[serde(flatten)]
    snapshot: Snapshot,
}

/// Reads and writes the single snapshot record, enforcing its time-to-live
#[derive(Debug, Clone)]
pub struct SnapshotCache<S> {
    store: S,
    ttl: TimeDelta,
}

impl<S: KeyValueStore> SnapshotCache<S> {
    /// Create a snapshot cache with the standard 48 hour lifetime
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, TimeDelta::hours(SNAPSHOT_TTL_HOURS))
    }

    pub fn with_ttl(store: S, ttl: TimeDelta) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the snapshot if one exists and is still fresh
    pub fn read(&self) -> Result<Option<Snapshot>> {
        self.read_at(Utc::now())
    }

    /// Load the snapshot as of `now`.
    ///
    /// Expired, unparseable and wrong-version records are removed and
    /// reported as absent.
    pub fn read_at(&self, now: DateTime<Utc>) -> Result<Option<Snapshot>> {
        let Some(raw) = self.store.get(SNAPSHOT_KEY)? else {
            return Ok(None);
        };

        let record: SnapshotRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Discarding unreadable snapshot cache: {}", e);
                self.clear()?;
                return Ok(None);
            }
        };

        if record.schema_version != SNAPSHOT_SCHEMA_VERSION {
            tracing::warn!(
                "Discarding snapshot cache with schema version {} (expected {})",
                record.schema_version,
                SNAPSHOT_SCHEMA_VERSION
            );
            self.clear()?;
            return Ok(None);
        }

        let age = now.signed_duration_since(record.snapshot.stored_at);
        if age < TimeDelta::zero() {
            tracing::warn!(
                "Snapshot cache is stamped {} in the future, clearing",
                record.snapshot.stored_at
            );
            self.clear()?;
            return Ok(None);
        }

        if age >= self.ttl {
            tracing::info!(
                "Snapshot cache expired ({}h old), clearing",
                age.num_hours()
            );
            self.clear()?;
            return Ok(None);
        }

        Ok(Some(record.snapshot))
    }

    /// Replace the snapshot with `documents` fetched at `commit_id`
    pub fn write(&self, documents: &[Document], commit_id: Option<&str>) -> Result<Snapshot> {
        self.write_at(documents, commit_id, Utc::now())
    }

    /// Replace the snapshot, stamping it with `stored_at`
    pub fn write_at(
        &self,
        documents: &[Document],
        commit_id: Option<&str>,
        stored_at: DateTime<Utc>,
    ) -> Result<Snapshot> {
        let record = SnapshotRecord {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            snapshot: Snapshot {
                documents: documents.to_vec(),
                commit_id: commit_id.map(String::from),
                stored_at,
            },
        };

        let json = serde_json::to_string(&record).context("Failed to serialize snapshot")?;
        self.store
            .set(SNAPSHOT_KEY, &json)
            .context("Failed to store snapshot")?;

        tracing::debug!(
            "Cached {} documents at commit {:?}",
            record.snapshot.documents.len(),
            record.snapshot.commit_id
        );
        Ok(record.snapshot)
    }

    /// Remove the snapshot unconditionally
    pub fn clear(&self) -> Result<()> {
        self.store
            .remove(SNAPSHOT_KEY)
            .context("Failed to clear snapshot cache")
    }
}
