//! # shopify-wc-migrate
//!
//! Shopify to WooCommerce store migration engine.
//!
//! This library transfers the full data graph of a storefront - catalog,
//! inventory, customers, order history, discounts and content pages - from
//! the Shopify Admin API into the WooCommerce REST API, with support for:
//!
//! - **Idempotent upserts** via a durable correlation store: reruns never
//!   duplicate data, and changed source entities become updates
//! - **Dependency-ordered phases** (categories before products before
//!   orders), with topological ordering inside the category forest
//! - **Rate-limited, retrying transport** with exponential backoff
//! - **Dry-run mode** that reports every decision without writing anything
//! - **Resumable runs**: cancellation lets in-flight writes record their
//!   correlation entries, so the next run picks up exactly where it stopped
//!
//! ## Example
//!
//! ```rust,no_run
//! use shopify_wc_migrate::{Config, MigrationPlan, Orchestrator, RunMode};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> shopify_wc_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config)?;
//!     let report = orchestrator
//!         .run(&MigrationPlan::default(), RunMode::Apply, CancellationToken::new())
//!         .await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod correlation;
pub mod entities;
pub mod error;
pub mod mapper;
pub mod orchestrator;
pub mod report;
pub mod source;
pub mod target;
pub mod transport;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use correlation::{CorrelationRecord, CorrelationStore};
pub use entities::EntityKind;
pub use error::{MigrateError, Result};
pub use orchestrator::{HealthCheckResult, MigrationPlan, Orchestrator, RunMode};
pub use report::{EntityCounters, Reporter, RunReport};
pub use source::{Page, ShopifyClient, SourceApi};
pub use target::{TargetApi, WooClient, WrittenProduct};
