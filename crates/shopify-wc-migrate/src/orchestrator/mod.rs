//! Migration orchestrator - main workflow coordinator.
//!
//! Sequences phases in dependency order, drives pagination, dispatches
//! batched idempotent writes through a bounded worker pool, keeps the
//! correlation store current and aggregates the run report.

mod phases;

use crate::config::Config;
use crate::correlation::{CorrelationStore, ResolverOverlay};
use crate::entities::EntityKind;
use crate::error::{MigrateError, Result};
use crate::report::{Reporter, RunReport};
use crate::source::{ShopifyClient, SourceApi};
use crate::target::{TargetApi, WooClient};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Execution mode for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Compute and report every decision; write nothing, persist nothing.
    DryRun,
    /// Perform the migration.
    Apply,
}

impl RunMode {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, RunMode::DryRun)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::DryRun => "dry_run",
            RunMode::Apply => "apply",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered list of phases to execute.
///
/// The default order is the dependency order: categories before products
/// (which reference them), products before orders (whose line items
/// reference variants), customers before orders.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub phases: Vec<EntityKind>,
}

impl Default for MigrationPlan {
    fn default() -> Self {
        Self {
            phases: EntityKind::PHASE_ORDER.to_vec(),
        }
    }
}

impl MigrationPlan {
    /// A plan running a single phase, for targeted re-runs.
    pub fn single(kind: EntityKind) -> Self {
        Self { phases: vec![kind] }
    }
}

/// Result of a connectivity health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    pub target_error: Option<String>,
    pub healthy: bool,
}

/// Shared per-run state handed to the phase drivers.
pub(crate) struct PhaseCtx<'a> {
    pub mode: RunMode,
    pub cancel: &'a CancellationToken,
    pub reporter: &'a Reporter,
    pub overlay: &'a ResolverOverlay<'a>,
}

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    source: Arc<dyn SourceApi>,
    target: Arc<dyn TargetApi>,
    store: CorrelationStore,
}

impl Orchestrator {
    /// Create an orchestrator with the real platform clients and the
    /// correlation store from the configured path.
    pub fn new(config: Config) -> Result<Self> {
        let source = ShopifyClient::new(&config.source, &config.migration)?;
        let target = WooClient::new(&config.target, &config.migration)?;
        let store = CorrelationStore::load(&config.migration.correlation_file)?;
        Ok(Self {
            config,
            source: Arc::new(source),
            target: Arc::new(target),
            store,
        })
    }

    /// Create an orchestrator from explicit parts. Used by tests and by
    /// callers bringing their own transports.
    pub fn from_parts(
        config: Config,
        source: Arc<dyn SourceApi>,
        target: Arc<dyn TargetApi>,
        store: CorrelationStore,
    ) -> Self {
        Self {
            config,
            source,
            target,
            store,
        }
    }

    /// Run the migration plan.
    ///
    /// Entity-level failures are recorded and skipped past; a phase-level
    /// or fatal error stops the remaining phases. The run always produces
    /// a report - check its `status` field.
    pub async fn run(
        &self,
        plan: &MigrationPlan,
        mode: RunMode,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let reporter = Reporter::new();
        let overlay = ResolverOverlay::new(&self.store);

        info!(
            "Starting migration run {} ({}) with {} phases",
            run_id,
            mode,
            plan.phases.len()
        );

        let ctx = PhaseCtx {
            mode,
            cancel: &cancel,
            reporter: &reporter,
            overlay: &overlay,
        };

        let mut aborted = false;
        for (index, kind) in plan.phases.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }
            info!("Phase {}/{}: migrating {}", index + 1, plan.phases.len(), kind);

            let result = match kind {
                EntityKind::Category => self.migrate_categories(&ctx).await,
                EntityKind::Product => self.migrate_products(&ctx).await,
                EntityKind::Customer => self.migrate_customers(&ctx).await,
                EntityKind::Order => self.migrate_orders(&ctx).await,
                EntityKind::Coupon => self.migrate_coupons(&ctx).await,
                EntityKind::Page => self.migrate_pages(&ctx).await,
                EntityKind::Variant => {
                    // Variants migrate with their owning product.
                    warn!("Skipping standalone variant phase");
                    Ok(())
                }
            };

            if let Err(e) = result {
                error!("Phase {} aborted the run: {}", kind, e);
                reporter.error(*kind, "-", e.kind_tag(), e.to_string());
                aborted = true;
                break;
            }

            self.flush(mode)?;
        }

        self.flush(mode)?;

        let status = if aborted {
            "aborted"
        } else if cancel.is_cancelled() {
            "cancelled"
        } else if reporter.counters_snapshot().values().any(|c| c.failed > 0) {
            "completed_with_failures"
        } else {
            "completed"
        };

        let report = reporter.finish(
            run_id,
            mode.as_str().to_string(),
            status.to_string(),
            self.config.hash(),
            started_at,
        );

        info!(
            "Migration {}: {} created, {} failed in {:.1}s",
            report.status,
            report.total_created(),
            report.total_failed(),
            report.duration_seconds
        );

        Ok(report)
    }

    /// Check connectivity and credentials on both sides.
    pub async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let source_result = self.source.ping().await;
        let source_latency_ms = start.elapsed().as_millis() as u64;

        let start = Instant::now();
        let target_result = self.target.ping().await;
        let target_latency_ms = start.elapsed().as_millis() as u64;

        let healthy = source_result.is_ok() && target_result.is_ok();
        HealthCheckResult {
            source_connected: source_result.is_ok(),
            source_latency_ms,
            source_error: source_result.err().map(|e| e.to_string()),
            target_connected: target_result.is_ok(),
            target_latency_ms,
            target_error: target_result.err().map(|e| e.to_string()),
            healthy,
        }
    }

    /// Number of correlation records currently held.
    pub fn correlation_len(&self) -> usize {
        self.store.len()
    }

    /// Persist the correlation store; dry-run never touches the file.
    fn flush(&self, mode: RunMode) -> Result<()> {
        if mode.is_dry_run() {
            return Ok(());
        }
        self.store.flush()
    }

    pub(crate) fn store(&self) -> &CorrelationStore {
        &self.store
    }

    pub(crate) fn page_size(&self) -> usize {
        self.config.migration.page_size
    }

    pub(crate) fn workers(&self) -> usize {
        self.config.migration.workers.max(1)
    }

    pub(crate) fn source_api(&self) -> &dyn SourceApi {
        self.source.as_ref()
    }

    pub(crate) fn target_api(&self) -> &dyn TargetApi {
        self.target.as_ref()
    }
}

/// Translate a mapper error into the engine taxonomy.
pub(crate) fn map_error_to_migrate(
    err: crate::mapper::MapError,
    kind: EntityKind,
    source_id: &str,
) -> MigrateError {
    match err {
        crate::mapper::MapError::DependencyNotReady { kind, source_id } => {
            MigrateError::DependencyNotReady {
                kind: kind.to_string(),
                source_id,
            }
        }
        crate::mapper::MapError::UnresolvedReference { kind, source_id } => {
            MigrateError::UnresolvedReference {
                kind: kind.to_string(),
                source_id,
            }
        }
        crate::mapper::MapError::Invalid(message) => {
            MigrateError::mapping(kind.to_string(), source_id, message)
        }
    }
}
