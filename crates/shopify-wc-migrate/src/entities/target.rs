//! Target entity shapes as accepted by the WooCommerce REST API.
//!
//! Ids are carried as strings end to end: correlation records are
//! platform-agnostic, and dry-run issues provisional non-numeric ids.

use serde::{Deserialize, Serialize};

/// A key/value metadata entry. The source id travels on every written
/// entity as a metadata idempotency hint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetaData {
    pub key: String,
    pub value: serde_json::Value,
}

impl MetaData {
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Reference to an already-migrated category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetCategoryRef {
    pub id: String,
}

/// An image attached to a product. Position 0 is the featured image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetImage {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    pub position: i32,
}

/// A product attribute axis shared by the product's variations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetAttribute {
    pub name: String,
    pub position: i32,
    pub visible: bool,
    pub variation: bool,
    pub options: Vec<String>,
}

/// One attribute choice on a variation, e.g. Size=M.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetVariationAttribute {
    pub name: String,
    pub option: String,
}

/// A concrete purchasable variation keyed by its attribute tuple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetVariation {
    /// Source variant id, used to correlate the created variation.
    /// Engine-internal: never sent over the wire.
    #[serde(skip_serializing, default)]
    pub source_variant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub regular_price: String,
    pub manage_stock: bool,
    pub stock_quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    pub attributes: Vec<TargetVariationAttribute>,
}

/// A product, simple or variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetProduct {
    pub name: String,
    /// "simple" or "variable".
    #[serde(rename = "type")]
    pub product_type: String,
    pub description: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    pub manage_stock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    pub stock_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    pub categories: Vec<TargetCategoryRef>,
    pub images: Vec<TargetImage>,
    pub attributes: Vec<TargetAttribute>,
    pub variations: Vec<TargetVariation>,
    pub tags: Vec<TargetTag>,
    pub meta_data: Vec<MetaData>,
}

/// A product tag, created by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetTag {
    pub name: String,
}

/// A product category node in the single-rooted tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetCategory {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub description: String,
    /// Target id of the parent category; None for roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub meta_data: Vec<MetaData>,
}

/// A billing or shipping address block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TargetAddress {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A customer account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub billing: TargetAddress,
    pub shipping: TargetAddress,
    pub meta_data: Vec<MetaData>,
}

/// An order line item referencing target product/variation ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetLineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub price: String,
    pub total: String,
    pub meta_data: Vec<MetaData>,
}

/// A shipping charge line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetShippingLine {
    pub method_id: String,
    pub method_title: String,
    pub total: String,
}

/// A tax charge line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetTaxLine {
    pub rate_code: String,
    pub label: String,
    pub tax_total: String,
}

/// A refund adjustment against one order line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetRefundLine {
    /// Source line item id the adjustment applies to.
    pub line_item_ref: String,
    pub quantity: i64,
    pub amount: String,
}

/// An order with resolved line item references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetOrder {
    pub status: String,
    pub currency: String,
    /// "0" for guest orders.
    pub customer_id: String,
    pub billing: TargetAddress,
    pub shipping: TargetAddress,
    pub line_items: Vec<TargetLineItem>,
    pub shipping_lines: Vec<TargetShippingLine>,
    pub tax_lines: Vec<TargetTaxLine>,
    pub refunds: Vec<TargetRefundLine>,
    pub payment_method: String,
    pub payment_method_title: String,
    pub set_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    pub meta_data: Vec<MetaData>,
}

/// A discount coupon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetCoupon {
    pub code: String,
    /// "percent" or "fixed_cart".
    pub discount_type: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_expires: Option<String>,
    pub free_shipping: bool,
    pub product_ids: Vec<String>,
    pub product_categories: Vec<String>,
    pub meta_data: Vec<MetaData>,
}

/// A content page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetPage {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub content: String,
    pub status: String,
    pub meta_data: Vec<MetaData>,
}
