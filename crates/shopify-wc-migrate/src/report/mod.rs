//! Run report: per-kind outcome counters and the structured issue list.
//!
//! The report is accumulated incrementally through a cloneable [`Reporter`]
//! handle so a live progress view can snapshot it mid-run, and finalized
//! into a serializable [`RunReport`] at the end.

use crate::entities::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

/// Outcome of processing one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    Skipped,
    Failed,
}

/// Per-kind outcome counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityCounters {
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl EntityCounters {
    pub fn total(&self) -> u64 {
        self.created + self.updated + self.unchanged + self.skipped + self.failed
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// One recorded failure or warning with enough context for a targeted
/// re-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub kind: EntityKind,
    pub source_id: String,
    pub error_kind: String,
    pub message: String,
    pub severity: Severity,
}

/// Final (or snapshot) result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: String,

    /// "dry_run" or "apply".
    pub mode: String,

    /// Final status: "completed", "completed_with_failures" or "cancelled".
    pub status: String,

    /// SHA256 hash of the configuration, for the audit trail.
    pub config_hash: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Per-kind outcome counters.
    pub counters: BTreeMap<EntityKind, EntityCounters>,

    /// Failures and warnings, in the order they occurred.
    pub issues: Vec<Issue>,
}

impl RunReport {
    /// Counters for one kind (zeroes when the phase never ran).
    pub fn counters_for(&self, kind: EntityKind) -> EntityCounters {
        self.counters.get(&kind).copied().unwrap_or_default()
    }

    /// Total failed entities across kinds.
    pub fn total_failed(&self) -> u64 {
        self.counters.values().map(|c| c.failed).sum()
    }

    /// Total created entities across kinds.
    pub fn total_created(&self) -> u64 {
        self.counters.values().map(|c| c.created).sum()
    }

    /// Convert to pretty JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the human-readable migration summary.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Migration {} ({})", self.status, self.mode);
        let _ = writeln!(out, "  Run ID: {}", self.run_id);
        let _ = writeln!(out, "  Duration: {:.1}s", self.duration_seconds);
        for (kind, c) in &self.counters {
            let _ = writeln!(
                out,
                "  {:<10} created {:>5}  updated {:>5}  unchanged {:>5}  skipped {:>5}  failed {:>5}",
                kind, c.created, c.updated, c.unchanged, c.skipped, c.failed
            );
        }
        let errors = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        let warnings = self.issues.len() - errors;
        let _ = writeln!(out, "  Issues: {} errors, {} warnings", errors, warnings);
        for issue in self.issues.iter().filter(|i| i.severity == Severity::Error) {
            let _ = writeln!(
                out,
                "    {} {} [{}]: {}",
                issue.kind, issue.source_id, issue.error_kind, issue.message
            );
        }
        out
    }
}

#[derive(Debug, Default)]
struct ReporterState {
    counters: BTreeMap<EntityKind, EntityCounters>,
    issues: Vec<Issue>,
}

/// Cloneable handle for incremental report accumulation.
#[derive(Clone, Default)]
pub struct Reporter {
    state: Arc<Mutex<ReporterState>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an outcome for a kind.
    pub fn record(&self, kind: EntityKind, outcome: Outcome) {
        let mut state = self.state.lock().expect("report lock poisoned");
        state.counters.entry(kind).or_default().record(outcome);
    }

    /// Record an entity-level failure.
    pub fn error(
        &self,
        kind: EntityKind,
        source_id: impl Into<String>,
        error_kind: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(kind, source_id, error_kind, message, Severity::Error);
    }

    /// Record an informational warning.
    pub fn warning(&self, kind: EntityKind, source_id: impl Into<String>, message: impl Into<String>) {
        self.push(kind, source_id, "warning", message, Severity::Warning);
    }

    fn push(
        &self,
        kind: EntityKind,
        source_id: impl Into<String>,
        error_kind: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) {
        let mut state = self.state.lock().expect("report lock poisoned");
        state.issues.push(Issue {
            kind,
            source_id: source_id.into(),
            error_kind: error_kind.into(),
            message: message.into(),
            severity,
        });
    }

    /// Snapshot the counters accumulated so far.
    pub fn counters_snapshot(&self) -> BTreeMap<EntityKind, EntityCounters> {
        self.state.lock().expect("report lock poisoned").counters.clone()
    }

    /// Finalize into a [`RunReport`].
    pub fn finish(
        &self,
        run_id: String,
        mode: String,
        status: String,
        config_hash: String,
        started_at: DateTime<Utc>,
    ) -> RunReport {
        let state = self.state.lock().expect("report lock poisoned");
        let completed_at = Utc::now();
        RunReport {
            run_id,
            mode,
            status,
            config_hash,
            started_at,
            completed_at,
            duration_seconds: (completed_at - started_at).num_milliseconds() as f64 / 1000.0,
            counters: state.counters.clone(),
            issues: state.issues.clone(),
        }
    }
}
