//! Durable correlation between source and target entity identities.
//!
//! The store is the system of record for idempotency: one record per
//! (kind, source_id), carrying the target id, a content fingerprint and the
//! time of the last migration. Records are created on first successful write,
//! updated on re-migration, and never deleted by the engine.

use crate::entities::EntityKind;
use crate::error::{MigrateError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// One correlation record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationRecord {
    /// Target platform id.
    pub target_id: String,

    /// Content fingerprint of the source entity at migration time.
    pub fingerprint: String,

    /// When the entity was last migrated.
    pub last_migrated_at: DateTime<Utc>,
}

/// Read-only resolution of source ids to target ids, as seen by the mapper.
pub trait ResolveTargetId: Send + Sync {
    fn resolve(&self, kind: EntityKind, source_id: &str) -> Option<String>;
}

/// Compute the content fingerprint of a source entity.
///
/// SHA-256 over the key-sorted JSON serialization, so field order in the
/// API response never changes the fingerprint.
pub fn fingerprint<T: Serialize>(entity: &T) -> Result<String> {
    let value = serde_json::to_value(entity)?;
    let bytes = serde_json::to_vec(&value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Durable (kind, source_id) → record map with atomic file persistence.
pub struct CorrelationStore {
    path: Option<PathBuf>,
    records: RwLock<HashMap<(EntityKind, String), CorrelationRecord>>,
}

impl CorrelationStore {
    /// Load the store from a JSON file; a missing file yields an empty store.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let raw: BTreeMap<String, CorrelationRecord> = serde_json::from_str(&content)?;
            let mut records = HashMap::with_capacity(raw.len());
            for (key, record) in raw {
                records.insert(parse_key(&key)?, record);
            }
            records
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    /// An unpersisted store, for tests and ad-hoc runs.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the record for a source entity.
    pub fn get(&self, kind: EntityKind, source_id: &str) -> Option<CorrelationRecord> {
        self.records
            .read()
            .expect("correlation lock poisoned")
            .get(&(kind, source_id.to_string()))
            .cloned()
    }

    /// Upsert the record for a source entity, stamping the migration time.
    pub fn put(
        &self,
        kind: EntityKind,
        source_id: &str,
        target_id: impl Into<String>,
        fingerprint: impl Into<String>,
    ) {
        let record = CorrelationRecord {
            target_id: target_id.into(),
            fingerprint: fingerprint.into(),
            last_migrated_at: Utc::now(),
        };
        self.records
            .write()
            .expect("correlation lock poisoned")
            .insert((kind, source_id.to_string()), record);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.read().expect("correlation lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist the store atomically (write temp file, then rename).
    ///
    /// A store without a path (in-memory) flushes as a no-op.
    pub fn flush(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        let raw: BTreeMap<String, CorrelationRecord> = {
            let records = self.records.read().expect("correlation lock poisoned");
            records
                .iter()
                .map(|((kind, id), record)| (format!("{}:{}", kind, id), record.clone()))
                .collect()
        };

        let content = serde_json::to_string_pretty(&raw)?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl ResolveTargetId for CorrelationStore {
    fn resolve(&self, kind: EntityKind, source_id: &str) -> Option<String> {
        self.get(kind, source_id).map(|r| r.target_id)
    }
}

fn parse_key(key: &str) -> Result<(EntityKind, String)> {
    let (kind, id) = key.split_once(':').ok_or_else(|| {
        MigrateError::Correlation(format!("malformed correlation key '{}'", key))
    })?;
    let kind: EntityKind = serde_json::from_value(serde_json::Value::String(kind.to_string()))
        .map_err(|_| MigrateError::Correlation(format!("unknown entity kind in key '{}'", key)))?;
    Ok((kind, id.to_string()))
}

/// A correlation view layered with provisional, run-local mappings.
///
/// Dry-run issues provisional ids for would-create entities so later phases
/// can simulate reference resolution; none of it reaches the store or disk.
pub struct ResolverOverlay<'a> {
    base: &'a CorrelationStore,
    provisional: RwLock<HashMap<(EntityKind, String), String>>,
}

impl<'a> ResolverOverlay<'a> {
    pub fn new(base: &'a CorrelationStore) -> Self {
        Self {
            base,
            provisional: RwLock::new(HashMap::new()),
        }
    }

    /// Register a provisional target id for a would-create entity.
    pub fn add_provisional(&self, kind: EntityKind, source_id: &str) -> String {
        let target_id = format!("dry-run:{}:{}", kind, source_id);
        self.provisional
            .write()
            .expect("overlay lock poisoned")
            .insert((kind, source_id.to_string()), target_id.clone());
        target_id
    }
}

impl ResolveTargetId for ResolverOverlay<'_> {
    fn resolve(&self, kind: EntityKind, source_id: &str) -> Option<String> {
        if let Some(id) = self
            .provisional
            .read()
            .expect("overlay lock poisoned")
            .get(&(kind, source_id.to_string()))
        {
            return Some(id.clone());
        }
        self.base.resolve(kind, source_id)
    }
}
