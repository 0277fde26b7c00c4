//! Target platform writes: the `TargetApi` seam and its WooCommerce client.

mod woocommerce;

pub use woocommerce::WooClient;

use crate::entities::target::{
    TargetCategory, TargetCoupon, TargetCustomer, TargetOrder, TargetPage, TargetProduct,
};
use crate::error::Result;
use async_trait::async_trait;

/// Result of writing a product: the product id plus the target variation id
/// for each source variant, so variants can be correlated individually.
#[derive(Debug, Clone)]
pub struct WrittenProduct {
    pub product_id: String,
    /// (source variant id, target variation id) pairs.
    pub variations: Vec<(String, String)>,
}

/// Idempotent create/update writes against the target platform.
///
/// The engine performs read-before-write through the correlation store;
/// implementations only need plain create and update calls.
#[async_trait]
pub trait TargetApi: Send + Sync {
    async fn create_category(&self, category: &TargetCategory) -> Result<String>;
    async fn update_category(&self, target_id: &str, category: &TargetCategory) -> Result<String>;

    async fn create_product(&self, product: &TargetProduct) -> Result<WrittenProduct>;
    async fn update_product(
        &self,
        target_id: &str,
        product: &TargetProduct,
    ) -> Result<WrittenProduct>;

    async fn create_customer(&self, customer: &TargetCustomer) -> Result<String>;
    async fn update_customer(&self, target_id: &str, customer: &TargetCustomer) -> Result<String>;

    async fn create_order(&self, order: &TargetOrder) -> Result<String>;
    async fn update_order(&self, target_id: &str, order: &TargetOrder) -> Result<String>;

    async fn create_coupon(&self, coupon: &TargetCoupon) -> Result<String>;
    async fn update_coupon(&self, target_id: &str, coupon: &TargetCoupon) -> Result<String>;

    async fn create_page(&self, page: &TargetPage) -> Result<String>;
    async fn update_page(&self, target_id: &str, page: &TargetPage) -> Result<String>;

    /// Cheap connectivity and credential check.
    async fn ping(&self) -> Result<()>;
}
