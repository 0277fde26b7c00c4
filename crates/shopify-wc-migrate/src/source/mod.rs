//! Source platform reads: the `SourceApi` seam and its Shopify client.

mod shopify;

pub use shopify::ShopifyClient;

use crate::entities::source::{
    SourceCategory, SourceCoupon, SourceCustomer, SourceOrder, SourcePage, SourceProduct,
};
use crate::error::Result;
use async_trait::async_trait;

/// One page of source entities plus the cursor for the next page.
///
/// A `None` cursor means the resource is exhausted. Cursors are opaque
/// strings, so a run can restart pagination from the last one it saw.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

/// Paginated, typed reads from the source platform.
#[async_trait]
pub trait SourceApi: Send + Sync {
    async fn fetch_categories(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Page<SourceCategory>>;

    async fn fetch_products(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Page<SourceProduct>>;

    async fn fetch_customers(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Page<SourceCustomer>>;

    async fn fetch_orders(&self, cursor: Option<String>, limit: usize)
        -> Result<Page<SourceOrder>>;

    async fn fetch_coupons(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Page<SourceCoupon>>;

    async fn fetch_pages(&self, cursor: Option<String>, limit: usize) -> Result<Page<SourcePage>>;

    /// Cheap connectivity and credential check.
    async fn ping(&self) -> Result<()>;
}
