//! Per-phase migration drivers.
//!
//! Every phase follows the same shape: fetch pages sequentially, process
//! each page as a batch of individual idempotent upserts through a bounded
//! worker pool, requeue deferrable failures, then give the deferred queue
//! exactly one retry pass after the primary pass of the phase.

use super::{map_error_to_migrate, Orchestrator, PhaseCtx};
use crate::correlation::fingerprint;
use crate::entities::source::{
    SourceCategory, SourceCoupon, SourceCustomer, SourceOrder, SourcePage, SourceProduct,
};
use crate::entities::EntityKind;
use crate::error::{MigrateError, Result};
use crate::mapper;
use crate::report::Outcome;
use crate::source::Page;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use tracing::{debug, info};

/// What to do with one entity, per the correlation store.
enum Decision {
    Create,
    Update(String),
    Skip,
}

impl Orchestrator {
    fn decide(&self, kind: EntityKind, source_id: &str, fp: &str) -> Decision {
        match self.store().get(kind, source_id) {
            None => Decision::Create,
            Some(record) if record.fingerprint == fp => Decision::Skip,
            Some(record) => Decision::Update(record.target_id),
        }
    }

    /// Process a batch concurrently. Returns the entities to requeue for
    /// the deferred pass; on the final pass deferrable errors become
    /// entity-level failures instead.
    async fn run_batch<T, F, Fut>(
        &self,
        ctx: &PhaseCtx<'_>,
        kind: EntityKind,
        items: Vec<T>,
        concurrency: usize,
        final_pass: bool,
        process: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = (T, String, Result<()>)>,
    {
        let results: Vec<(T, String, Result<()>)> = stream::iter(items.into_iter().map(process))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let mut requeue = Vec::new();
        for (item, source_id, result) in results {
            match result {
                Ok(()) => {}
                // Cancellation mid-batch: the entity was never attempted.
                Err(MigrateError::Cancelled) => {
                    ctx.reporter.record(kind, Outcome::Skipped);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) if e.is_deferrable() && !final_pass => {
                    debug!("{} {}: deferred ({})", kind, source_id, e);
                    requeue.push(item);
                }
                Err(e) => {
                    ctx.reporter.record(kind, Outcome::Failed);
                    ctx.reporter
                        .error(kind, source_id, e.kind_tag(), e.to_string());
                }
            }
        }
        Ok(requeue)
    }

    /// Drive a paginated phase: sequential page fetches, concurrent batch
    /// dispatch, one deferred retry pass at phase end.
    async fn run_paged_phase<T, FFetch, FetchFut, FProc, ProcFut>(
        &self,
        ctx: &PhaseCtx<'_>,
        kind: EntityKind,
        fetch: FFetch,
        process: FProc,
    ) -> Result<()>
    where
        FFetch: Fn(Option<String>, usize) -> FetchFut,
        FetchFut: Future<Output = Result<Page<T>>>,
        FProc: Fn(T) -> ProcFut,
        ProcFut: Future<Output = (T, String, Result<()>)>,
    {
        let limit = self.page_size();
        let workers = self.workers();
        let mut cursor: Option<String> = None;
        let mut deferred: Vec<T> = Vec::new();
        let mut fetched = 0usize;

        loop {
            if ctx.cancel.is_cancelled() {
                return Ok(());
            }
            let Page { items, next_cursor } = fetch(cursor.clone(), limit).await?;
            fetched += items.len();

            let requeue = self
                .run_batch(ctx, kind, items, workers, false, &process)
                .await?;
            deferred.extend(requeue);
            self.flush(ctx.mode)?;

            match next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        if !deferred.is_empty() && !ctx.cancel.is_cancelled() {
            info!("{}: retrying {} deferred entities", kind, deferred.len());
            self.run_batch(ctx, kind, deferred, workers, true, &process)
                .await?;
            self.flush(ctx.mode)?;
        }

        info!("{}: {} entities fetched", kind, fetched);
        Ok(())
    }

    fn record_warnings(&self, ctx: &PhaseCtx<'_>, kind: EntityKind, id: &str, warnings: &[String]) {
        for warning in warnings {
            ctx.reporter.warning(kind, id, warning);
        }
    }

    // ===== Categories =====

    /// Categories migrate in parent-before-child topological order; cycle
    /// members are failed with a structural error without blocking their
    /// acyclic siblings. Writes are sequential because each child needs
    /// its parent's fresh target id.
    pub(super) async fn migrate_categories(&self, ctx: &PhaseCtx<'_>) -> Result<()> {
        let kind = EntityKind::Category;
        let limit = self.page_size();

        // The topological sort needs the whole forest up front.
        let mut all = Vec::new();
        let mut cursor = None;
        loop {
            if ctx.cancel.is_cancelled() {
                return Ok(());
            }
            let Page { items, next_cursor } = self.source_api().fetch_categories(cursor, limit).await?;
            all.extend(items);
            match next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        info!("category: {} collections fetched", all.len());

        let (ordered, cyclic) = topo_order(all);
        for category in &cyclic {
            ctx.reporter.record(kind, Outcome::Failed);
            ctx.reporter.error(
                kind,
                category.id.to_string(),
                "structural",
                format!(
                    "collection '{}' is part of a parent reference cycle",
                    category.title
                ),
            );
        }

        let process = |category: SourceCategory| async move {
            let id = category.id.to_string();
            let result = self.process_category(ctx, &category).await;
            (category, id, result)
        };

        let deferred = self.run_batch(ctx, kind, ordered, 1, false, &process).await?;
        self.flush(ctx.mode)?;

        if !deferred.is_empty() && !ctx.cancel.is_cancelled() {
            info!("category: retrying {} deferred entities", deferred.len());
            self.run_batch(ctx, kind, deferred, 1, true, &process).await?;
            self.flush(ctx.mode)?;
        }
        Ok(())
    }

    async fn process_category(&self, ctx: &PhaseCtx<'_>, src: &SourceCategory) -> Result<()> {
        if ctx.cancel.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }
        let kind = EntityKind::Category;
        let id = src.id.to_string();
        let fp = fingerprint(src)?;

        let mapped = mapper::map_category(src, ctx.overlay)
            .map_err(|e| map_error_to_migrate(e, kind, &id))?;
        self.record_warnings(ctx, kind, &id, &mapped.warnings);

        match self.decide(kind, &id, &fp) {
            Decision::Skip => {
                debug!("category {}: unchanged", id);
                ctx.reporter.record(kind, Outcome::Unchanged);
            }
            Decision::Create => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would create category '{}'", src.title);
                    ctx.overlay.add_provisional(kind, &id);
                } else {
                    let target_id = self.target_api().create_category(&mapped.entity).await?;
                    self.store().put(kind, &id, &target_id, &fp);
                    info!("Created category '{}' -> {}", src.title, target_id);
                }
                ctx.reporter.record(kind, Outcome::Created);
            }
            Decision::Update(target_id) => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would update category '{}'", src.title);
                } else {
                    self.target_api()
                        .update_category(&target_id, &mapped.entity)
                        .await?;
                    self.store().put(kind, &id, &target_id, &fp);
                    info!("Updated category '{}' ({})", src.title, target_id);
                }
                ctx.reporter.record(kind, Outcome::Updated);
            }
        }
        Ok(())
    }

    // ===== Products =====

    pub(super) async fn migrate_products(&self, ctx: &PhaseCtx<'_>) -> Result<()> {
        self.run_paged_phase(
            ctx,
            EntityKind::Product,
            |cursor, limit| self.source_api().fetch_products(cursor, limit),
            |product: SourceProduct| async move {
                let id = product.id.to_string();
                let result = self.process_product(ctx, &product).await;
                (product, id, result)
            },
        )
        .await
    }

    async fn process_product(&self, ctx: &PhaseCtx<'_>, src: &SourceProduct) -> Result<()> {
        if ctx.cancel.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }
        let kind = EntityKind::Product;
        let id = src.id.to_string();
        let fp = fingerprint(src)?;

        let mapped = mapper::map_product(src, ctx.overlay)
            .map_err(|e| map_error_to_migrate(e, kind, &id))?;
        self.record_warnings(ctx, kind, &id, &mapped.warnings);

        match self.decide(kind, &id, &fp) {
            Decision::Skip => {
                debug!("product {}: unchanged", id);
                ctx.reporter.record(kind, Outcome::Unchanged);
            }
            Decision::Create => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would create product '{}'", src.title);
                    ctx.overlay.add_provisional(kind, &id);
                    for variant in &src.variants {
                        ctx.overlay
                            .add_provisional(EntityKind::Variant, &variant.id.to_string());
                    }
                } else {
                    let written = self.target_api().create_product(&mapped.entity).await?;
                    self.correlate_product(src, &written, &fp);
                    info!("Created product '{}' -> {}", src.title, written.product_id);
                }
                ctx.reporter.record(kind, Outcome::Created);
            }
            Decision::Update(target_id) => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would update product '{}'", src.title);
                } else {
                    let written = self
                        .target_api()
                        .update_product(&target_id, &mapped.entity)
                        .await?;
                    self.correlate_product(src, &written, &fp);
                    info!("Updated product '{}' ({})", src.title, target_id);
                }
                ctx.reporter.record(kind, Outcome::Updated);
            }
        }
        Ok(())
    }

    /// Record the product and every variant of it. A simple product's sole
    /// implicit variant correlates to the product id itself; the order
    /// mapper recognizes that case and emits a product-only line item.
    fn correlate_product(
        &self,
        src: &SourceProduct,
        written: &crate::target::WrittenProduct,
        fp: &str,
    ) {
        let id = src.id.to_string();
        self.store()
            .put(EntityKind::Product, &id, &written.product_id, fp);

        let by_source: HashMap<&str, &str> = written
            .variations
            .iter()
            .map(|(source, target)| (source.as_str(), target.as_str()))
            .collect();

        for variant in &src.variants {
            let variant_id = variant.id.to_string();
            let target = by_source
                .get(variant_id.as_str())
                .copied()
                .unwrap_or(written.product_id.as_str());
            self.store().put(EntityKind::Variant, &variant_id, target, fp);
        }
    }

    // ===== Customers =====

    pub(super) async fn migrate_customers(&self, ctx: &PhaseCtx<'_>) -> Result<()> {
        self.run_paged_phase(
            ctx,
            EntityKind::Customer,
            |cursor, limit| self.source_api().fetch_customers(cursor, limit),
            |customer: SourceCustomer| async move {
                let id = customer.id.to_string();
                let result = self.process_customer(ctx, &customer).await;
                (customer, id, result)
            },
        )
        .await
    }

    async fn process_customer(&self, ctx: &PhaseCtx<'_>, src: &SourceCustomer) -> Result<()> {
        if ctx.cancel.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }
        let kind = EntityKind::Customer;
        let id = src.id.to_string();
        let fp = fingerprint(src)?;

        let mapped =
            mapper::map_customer(src).map_err(|e| map_error_to_migrate(e, kind, &id))?;
        self.record_warnings(ctx, kind, &id, &mapped.warnings);

        match self.decide(kind, &id, &fp) {
            Decision::Skip => {
                ctx.reporter.record(kind, Outcome::Unchanged);
            }
            Decision::Create => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would create customer {}", mapped.entity.email);
                    ctx.overlay.add_provisional(kind, &id);
                } else {
                    let target_id = self.target_api().create_customer(&mapped.entity).await?;
                    self.store().put(kind, &id, &target_id, &fp);
                    info!("Created customer {} -> {}", mapped.entity.email, target_id);
                }
                ctx.reporter.record(kind, Outcome::Created);
            }
            Decision::Update(target_id) => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would update customer {}", mapped.entity.email);
                } else {
                    self.target_api()
                        .update_customer(&target_id, &mapped.entity)
                        .await?;
                    self.store().put(kind, &id, &target_id, &fp);
                }
                ctx.reporter.record(kind, Outcome::Updated);
            }
        }
        Ok(())
    }

    // ===== Orders =====

    pub(super) async fn migrate_orders(&self, ctx: &PhaseCtx<'_>) -> Result<()> {
        self.run_paged_phase(
            ctx,
            EntityKind::Order,
            |cursor, limit| self.source_api().fetch_orders(cursor, limit),
            |order: SourceOrder| async move {
                let id = order.id.to_string();
                let result = self.process_order(ctx, &order).await;
                (order, id, result)
            },
        )
        .await
    }

    async fn process_order(&self, ctx: &PhaseCtx<'_>, src: &SourceOrder) -> Result<()> {
        if ctx.cancel.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }
        let kind = EntityKind::Order;
        let id = src.id.to_string();
        let fp = fingerprint(src)?;

        let mapped = mapper::map_order(src, ctx.overlay)
            .map_err(|e| map_error_to_migrate(e, kind, &id))?;
        self.record_warnings(ctx, kind, &id, &mapped.warnings);

        match self.decide(kind, &id, &fp) {
            Decision::Skip => {
                ctx.reporter.record(kind, Outcome::Unchanged);
            }
            Decision::Create => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would create order {}", id);
                } else {
                    let target_id = self.target_api().create_order(&mapped.entity).await?;
                    self.store().put(kind, &id, &target_id, &fp);
                    info!("Created order {} -> {}", id, target_id);
                }
                ctx.reporter.record(kind, Outcome::Created);
            }
            Decision::Update(target_id) => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would update order {}", id);
                } else {
                    self.target_api()
                        .update_order(&target_id, &mapped.entity)
                        .await?;
                    self.store().put(kind, &id, &target_id, &fp);
                }
                ctx.reporter.record(kind, Outcome::Updated);
            }
        }
        Ok(())
    }

    // ===== Coupons =====

    pub(super) async fn migrate_coupons(&self, ctx: &PhaseCtx<'_>) -> Result<()> {
        self.run_paged_phase(
            ctx,
            EntityKind::Coupon,
            |cursor, limit| self.source_api().fetch_coupons(cursor, limit),
            |coupon: SourceCoupon| async move {
                let id = coupon.id.to_string();
                let result = self.process_coupon(ctx, &coupon).await;
                (coupon, id, result)
            },
        )
        .await
    }

    async fn process_coupon(&self, ctx: &PhaseCtx<'_>, src: &SourceCoupon) -> Result<()> {
        if ctx.cancel.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }
        let kind = EntityKind::Coupon;
        let id = src.id.to_string();
        let fp = fingerprint(src)?;

        let mapped = mapper::map_coupon(src, ctx.overlay)
            .map_err(|e| map_error_to_migrate(e, kind, &id))?;
        self.record_warnings(ctx, kind, &id, &mapped.warnings);

        match self.decide(kind, &id, &fp) {
            Decision::Skip => {
                ctx.reporter.record(kind, Outcome::Unchanged);
            }
            Decision::Create => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would create coupon '{}'", src.code);
                } else {
                    let target_id = self.target_api().create_coupon(&mapped.entity).await?;
                    self.store().put(kind, &id, &target_id, &fp);
                    info!("Created coupon '{}' -> {}", src.code, target_id);
                }
                ctx.reporter.record(kind, Outcome::Created);
            }
            Decision::Update(target_id) => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would update coupon '{}'", src.code);
                } else {
                    self.target_api()
                        .update_coupon(&target_id, &mapped.entity)
                        .await?;
                    self.store().put(kind, &id, &target_id, &fp);
                }
                ctx.reporter.record(kind, Outcome::Updated);
            }
        }
        Ok(())
    }

    // ===== Pages =====

    pub(super) async fn migrate_pages(&self, ctx: &PhaseCtx<'_>) -> Result<()> {
        self.run_paged_phase(
            ctx,
            EntityKind::Page,
            |cursor, limit| self.source_api().fetch_pages(cursor, limit),
            |page: SourcePage| async move {
                let id = page.id.to_string();
                let result = self.process_page(ctx, &page).await;
                (page, id, result)
            },
        )
        .await
    }

    async fn process_page(&self, ctx: &PhaseCtx<'_>, src: &SourcePage) -> Result<()> {
        if ctx.cancel.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }
        let kind = EntityKind::Page;
        let id = src.id.to_string();
        let fp = fingerprint(src)?;

        let mapped = mapper::map_page(src).map_err(|e| map_error_to_migrate(e, kind, &id))?;
        self.record_warnings(ctx, kind, &id, &mapped.warnings);

        match self.decide(kind, &id, &fp) {
            Decision::Skip => {
                ctx.reporter.record(kind, Outcome::Unchanged);
            }
            Decision::Create => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would create page '{}'", src.title);
                } else {
                    let target_id = self.target_api().create_page(&mapped.entity).await?;
                    self.store().put(kind, &id, &target_id, &fp);
                    info!("Created page '{}' -> {}", src.title, target_id);
                }
                ctx.reporter.record(kind, Outcome::Created);
            }
            Decision::Update(target_id) => {
                if ctx.mode.is_dry_run() {
                    info!("[dry-run] would update page '{}'", src.title);
                } else {
                    self.target_api()
                        .update_page(&target_id, &mapped.entity)
                        .await?;
                    self.store().put(kind, &id, &target_id, &fp);
                }
                ctx.reporter.record(kind, Outcome::Updated);
            }
        }
        Ok(())
    }
}

/// Kahn's algorithm over the parent forest. Returns categories in
/// parent-before-child order, plus the members of any reference cycle.
///
/// A parent id that is not in the fetched set does not pin its children:
/// either it was migrated in an earlier run (the correlation store resolves
/// it) or the mapping defers and eventually fails that child alone.
fn topo_order(categories: Vec<SourceCategory>) -> (Vec<SourceCategory>, Vec<SourceCategory>) {
    let ids: HashSet<u64> = categories.iter().map(|c| c.id).collect();

    let mut indegree: HashMap<u64, usize> = HashMap::new();
    let mut children: HashMap<u64, Vec<u64>> = HashMap::new();
    for category in &categories {
        let blocked = matches!(category.parent_id, Some(p) if ids.contains(&p));
        indegree.insert(category.id, usize::from(blocked));
        // A self-parent gets indegree 1 and no incoming edge, so it can
        // never be released: it falls out as a (trivial) cycle.
        if blocked && category.parent_id != Some(category.id) {
            children
                .entry(category.parent_id.unwrap())
                .or_default()
                .push(category.id);
        }
    }

    let mut queue: VecDeque<u64> = categories
        .iter()
        .filter(|c| indegree[&c.id] == 0)
        .map(|c| c.id)
        .collect();

    let mut ordered_ids = Vec::with_capacity(categories.len());
    while let Some(id) = queue.pop_front() {
        ordered_ids.push(id);
        if let Some(kids) = children.get(&id) {
            for kid in kids {
                let degree = indegree.get_mut(kid).expect("child tracked");
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(*kid);
                }
            }
        }
    }

    let ordered_set: HashSet<u64> = ordered_ids.iter().copied().collect();
    let mut by_id: HashMap<u64, SourceCategory> =
        categories.into_iter().map(|c| (c.id, c)).collect();

    let ordered = ordered_ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .collect();
    let mut cyclic: Vec<SourceCategory> = by_id
        .into_values()
        .filter(|c| !ordered_set.contains(&c.id))
        .collect();
    cyclic.sort_by_key(|c| c.id);

    (ordered, cyclic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: u64, parent_id: Option<u64>) -> SourceCategory {
        SourceCategory {
            id,
            title: format!("c{}", id),
            handle: None,
            body_html: None,
            parent_id,
        }
    }

    #[test]
    fn test_topo_orders_parents_first() {
        // 3 -> 2 -> 1, fetched in reverse order.
        let input = vec![
            category(3, Some(2)),
            category(2, Some(1)),
            category(1, None),
        ];
        let (ordered, cyclic) = topo_order(input);
        assert!(cyclic.is_empty());
        let ids: Vec<u64> = ordered.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_topo_detects_cycle_without_blocking_siblings() {
        let input = vec![
            category(1, Some(2)),
            category(2, Some(1)),
            category(3, None),
            category(4, Some(3)),
        ];
        let (ordered, cyclic) = topo_order(input);
        let ordered_ids: Vec<u64> = ordered.iter().map(|c| c.id).collect();
        let cyclic_ids: Vec<u64> = cyclic.iter().map(|c| c.id).collect();
        assert_eq!(ordered_ids, vec![3, 4]);
        assert_eq!(cyclic_ids, vec![1, 2]);
    }

    #[test]
    fn test_topo_unknown_parent_is_not_blocking() {
        // Parent 99 is not in the fetched set (migrated in a prior run).
        let input = vec![category(5, Some(99))];
        let (ordered, cyclic) = topo_order(input);
        assert_eq!(ordered.len(), 1);
        assert!(cyclic.is_empty());
    }

    #[test]
    fn test_topo_self_reference_is_a_cycle() {
        let input = vec![category(7, Some(7))];
        let (ordered, cyclic) = topo_order(input);
        assert!(ordered.is_empty());
        assert_eq!(cyclic.len(), 1);
        assert_eq!(cyclic[0].id, 7);
    }
}
