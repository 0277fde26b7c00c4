//! Typed source and target entity shapes.
//!
//! Source shapes deserialize from the Shopify Admin API; target shapes
//! serialize toward the WooCommerce REST API. The mapper translates between
//! them without touching the network.

pub mod source;
pub mod target;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of migratable entity kinds.
///
/// Variants get their own correlation records (distinct from their owning
/// product) so order line items can resolve variant ids directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Product,
    Variant,
    Customer,
    Order,
    Coupon,
    Page,
}

impl EntityKind {
    /// All kinds in default migration phase order.
    pub const PHASE_ORDER: [EntityKind; 6] = [
        EntityKind::Category,
        EntityKind::Product,
        EntityKind::Customer,
        EntityKind::Order,
        EntityKind::Coupon,
        EntityKind::Page,
    ];

    /// Stable lowercase name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Product => "product",
            EntityKind::Variant => "variant",
            EntityKind::Customer => "customer",
            EntityKind::Order => "order",
            EntityKind::Coupon => "coupon",
            EntityKind::Page => "page",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_starts_with_categories() {
        assert_eq!(EntityKind::PHASE_ORDER[0], EntityKind::Category);
        assert_eq!(EntityKind::PHASE_ORDER[1], EntityKind::Product);
        // Orders come after both products and customers.
        let order_pos = EntityKind::PHASE_ORDER
            .iter()
            .position(|k| *k == EntityKind::Order)
            .unwrap();
        let customer_pos = EntityKind::PHASE_ORDER
            .iter()
            .position(|k| *k == EntityKind::Customer)
            .unwrap();
        assert!(order_pos > customer_pos);
    }

    #[test]
    fn test_kind_serde_round_trip() {
        let json = serde_json::to_string(&EntityKind::Coupon).unwrap();
        assert_eq!(json, "\"coupon\"");
        let kind: EntityKind = serde_json::from_str("\"page\"").unwrap();
        assert_eq!(kind, EntityKind::Page);
    }
}
