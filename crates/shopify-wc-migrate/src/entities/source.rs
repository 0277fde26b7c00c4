//! Source entity shapes as returned by the Shopify Admin API.
//!
//! Fields the engine does not consume are omitted on purpose; unknown JSON
//! fields are ignored by serde. Monetary values stay strings, as the API
//! represents them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product with its variants, option axes and images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceProduct {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    /// "active" or "draft"/"archived".
    #[serde(default)]
    pub status: Option<String>,
    /// Comma-separated tag list.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    /// Ordered option axis definitions (Size, Color, ...).
    #[serde(default)]
    pub options: Vec<SourceOption>,
    #[serde(default)]
    pub variants: Vec<SourceVariant>,
    #[serde(default)]
    pub images: Vec<SourceImage>,
    /// Collections this product belongs to.
    #[serde(default)]
    pub collection_ids: Vec<u64>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
}

/// An option axis definition on a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOption {
    pub name: String,
    #[serde(default)]
    pub position: i32,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceVariant {
    pub id: u64,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: String,
    #[serde(default)]
    pub inventory_quantity: i64,
    #[serde(default)]
    pub weight: f64,
    /// "kg", "g", "lb" or "oz".
    #[serde(default = "default_weight_unit")]
    pub weight_unit: String,
    /// Positional option values matching the product's option axes.
    #[serde(default)]
    pub option1: Option<String>,
    #[serde(default)]
    pub option2: Option<String>,
    #[serde(default)]
    pub option3: Option<String>,
}

impl SourceVariant {
    /// Option values in axis order, skipping unset positions.
    pub fn option_values(&self) -> Vec<&str> {
        [&self.option1, &self.option2, &self.option3]
            .into_iter()
            .filter_map(|o| o.as_deref())
            .collect()
    }
}

fn default_weight_unit() -> String {
    "kg".to_string()
}

/// A product image reference. Order is significant: first is featured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceImage {
    #[serde(default)]
    pub id: Option<u64>,
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub position: i32,
}

/// A collection. Collections form a forest with possible cross-links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCategory {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub parent_id: Option<u64>,
}

/// Address role tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressRole {
    Billing,
    Shipping,
}

/// A postal address tagged with its role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceAddress {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<AddressRole>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A customer with contact fields and tagged addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCustomer {
    pub id: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub addresses: Vec<SourceAddress>,
}

/// An order line item referencing a variant by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceLineItem {
    pub id: u64,
    #[serde(default)]
    pub variant_id: Option<u64>,
    #[serde(default)]
    pub product_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    pub quantity: i64,
    pub price: String,
}

/// A shipping charge on an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceShippingLine {
    #[serde(default)]
    pub title: Option<String>,
    pub price: String,
}

/// A tax charge on an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTaxLine {
    #[serde(default)]
    pub title: Option<String>,
    pub price: String,
}

/// A refund against specific order lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRefund {
    pub id: u64,
    #[serde(default)]
    pub refund_line_items: Vec<SourceRefundLine>,
}

/// One refunded line: quantity and amount against a line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRefundLine {
    pub line_item_id: u64,
    pub quantity: i64,
    pub subtotal: String,
}

/// An order with line items, addresses, payment and refund records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOrder {
    pub id: u64,
    #[serde(default)]
    pub order_number: Option<u64>,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub fulfillment_status: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub customer_id: Option<u64>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub line_items: Vec<SourceLineItem>,
    #[serde(default)]
    pub billing_address: Option<SourceAddress>,
    #[serde(default)]
    pub shipping_address: Option<SourceAddress>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub shipping_lines: Vec<SourceShippingLine>,
    #[serde(default)]
    pub tax_lines: Vec<SourceTaxLine>,
    #[serde(default)]
    pub refunds: Vec<SourceRefund>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// A discount code with its restrictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCoupon {
    pub id: u64,
    pub code: String,
    /// "percentage", "fixed_amount" or "shipping".
    pub value_type: String,
    pub value: String,
    #[serde(default)]
    pub minimum_order_amount: Option<String>,
    #[serde(default)]
    pub usage_limit: Option<i64>,
    #[serde(default)]
    pub used_count: i64,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entitled_product_ids: Vec<u64>,
    #[serde(default)]
    pub entitled_collection_ids: Vec<u64>,
    /// Restriction descriptors the target platform has no equivalent for.
    #[serde(default)]
    pub other_restrictions: Vec<String>,
}

/// A content page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePage {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}
