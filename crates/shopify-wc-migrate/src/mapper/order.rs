//! Order mapping.

use super::{target_address, MapError, MapResult, Mapped};
use crate::correlation::ResolveTargetId;
use crate::entities::source::SourceOrder;
use crate::entities::target::{
    MetaData, TargetLineItem, TargetOrder, TargetRefundLine, TargetShippingLine, TargetTaxLine,
};
use crate::entities::EntityKind;

/// Map a source order, resolving line item variant references through the
/// correlation view.
///
/// A line item whose variant has no correlation record yields
/// `UnresolvedReference`; the orchestrator defers the order to the end of
/// the phase rather than dropping it. An order whose customer is unknown is
/// written as a guest order with an informational warning.
pub fn map_order(src: &SourceOrder, resolver: &dyn ResolveTargetId) -> MapResult<TargetOrder> {
    let mut warnings = Vec::new();

    let status = map_status(src);

    let customer_id = match src.customer_id {
        Some(customer_id) => {
            match resolver.resolve(EntityKind::Customer, &customer_id.to_string()) {
                Some(id) => id,
                None => {
                    warnings.push(format!(
                        "order {}: customer {} not migrated, importing as guest",
                        src.id, customer_id
                    ));
                    "0".to_string()
                }
            }
        }
        None => "0".to_string(),
    };

    let mut line_items = Vec::with_capacity(src.line_items.len());
    for item in &src.line_items {
        let (product_id, variation_id) = match (item.product_id, item.variant_id) {
            (Some(product_id), Some(variant_id)) => {
                let variation = resolver
                    .resolve(EntityKind::Variant, &variant_id.to_string())
                    .ok_or_else(|| MapError::unresolved(EntityKind::Variant, variant_id))?;
                let product = resolver
                    .resolve(EntityKind::Product, &product_id.to_string())
                    .ok_or_else(|| MapError::unresolved(EntityKind::Product, product_id))?;
                // A variant correlated to its product's own id is the sole
                // implicit variation of a simple product: no variation ref.
                if variation == product {
                    (Some(product), None)
                } else {
                    (Some(product), Some(variation))
                }
            }
            (Some(product_id), None) => {
                let product = resolver
                    .resolve(EntityKind::Product, &product_id.to_string())
                    .ok_or_else(|| MapError::unresolved(EntityKind::Product, product_id))?;
                (Some(product), None)
            }
            (None, Some(variant_id)) => {
                let variation = resolver
                    .resolve(EntityKind::Variant, &variant_id.to_string())
                    .ok_or_else(|| MapError::unresolved(EntityKind::Variant, variant_id))?;
                (None, Some(variation))
            }
            (None, None) => {
                // Custom line item: carried by name only.
                warnings.push(format!(
                    "order {}: line item '{}' has no product reference",
                    src.id,
                    item.title.as_deref().unwrap_or("untitled")
                ));
                (None, None)
            }
        };

        let price: f64 = item.price.parse().map_err(|_| {
            MapError::Invalid(format!(
                "order {}: unparseable line price '{}'",
                src.id, item.price
            ))
        })?;

        line_items.push(TargetLineItem {
            product_id,
            variation_id,
            name: item.title.clone().unwrap_or_default(),
            quantity: item.quantity,
            price: item.price.clone(),
            total: format!("{:.2}", price * item.quantity as f64),
            meta_data: vec![
                MetaData::new(
                    "_source_variant_id",
                    item.variant_id.map(|v| v.to_string()).unwrap_or_default(),
                ),
                MetaData::new(
                    "_source_product_id",
                    item.product_id.map(|p| p.to_string()).unwrap_or_default(),
                ),
            ],
        });
    }

    let shipping_lines = src
        .shipping_lines
        .iter()
        .map(|line| TargetShippingLine {
            method_id: "flat_rate".to_string(),
            method_title: line.title.clone().unwrap_or_else(|| "Shipping".to_string()),
            total: line.price.clone(),
        })
        .collect();

    let tax_lines = src
        .tax_lines
        .iter()
        .map(|line| TargetTaxLine {
            rate_code: line.title.clone().unwrap_or_else(|| "Tax".to_string()),
            label: line.title.clone().unwrap_or_else(|| "Tax".to_string()),
            tax_total: line.price.clone(),
        })
        .collect();

    // Refunds stay attached to the order as per-line adjustments.
    let refunds = src
        .refunds
        .iter()
        .flat_map(|refund| refund.refund_line_items.iter())
        .map(|line| TargetRefundLine {
            line_item_ref: line.line_item_id.to_string(),
            quantity: line.quantity,
            amount: line.subtotal.clone(),
        })
        .collect();

    let billing = target_address(
        src.billing_address.as_ref(),
        None,
        None,
        src.contact_email.as_deref(),
        None,
    );
    let shipping = target_address(
        src.shipping_address
            .as_ref()
            .or(src.billing_address.as_ref()),
        None,
        None,
        None,
        None,
    );

    let gateway = src.gateway.clone().unwrap_or_else(|| "unknown".to_string());
    let set_paid = matches!(
        src.financial_status.as_deref(),
        Some("paid") | Some("partially_paid")
    );

    let entity = TargetOrder {
        status: status.to_string(),
        currency: src.currency.clone(),
        customer_id,
        billing,
        shipping,
        line_items,
        shipping_lines,
        tax_lines,
        refunds,
        payment_method: gateway.clone(),
        payment_method_title: gateway,
        set_paid,
        customer_note: src.note.clone().filter(|n| !n.is_empty()),
        meta_data: vec![
            MetaData::new("_source_order_id", src.id.to_string()),
            MetaData::new(
                "_source_order_number",
                src.order_number.map(|n| n.to_string()).unwrap_or_default(),
            ),
        ],
    };

    Ok(Mapped { entity, warnings })
}

/// Fixed source → target status table. Fulfillment status wins over
/// financial status when both are present.
fn map_status(src: &SourceOrder) -> &'static str {
    let status = src
        .fulfillment_status
        .as_deref()
        .or(src.financial_status.as_deref())
        .unwrap_or("pending");
    match status {
        "pending" => "pending",
        "authorized" | "partially_paid" => "on-hold",
        "paid" => "processing",
        "partially_refunded" | "refunded" => "refunded",
        "voided" => "cancelled",
        "fulfilled" => "completed",
        "partially_fulfilled" | "unfulfilled" => "processing",
        _ => "pending",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationStore;
    use crate::entities::source::{SourceLineItem, SourceRefund, SourceRefundLine};

    fn line(id: u64, product_id: u64, variant_id: u64) -> SourceLineItem {
        SourceLineItem {
            id,
            variant_id: Some(variant_id),
            product_id: Some(product_id),
            title: Some("Tee / S / Red".to_string()),
            quantity: 2,
            price: "19.99".to_string(),
        }
    }

    fn order(lines: Vec<SourceLineItem>) -> SourceOrder {
        SourceOrder {
            id: 9000,
            order_number: Some(1001),
            financial_status: Some("paid".to_string()),
            fulfillment_status: None,
            currency: "EUR".to_string(),
            customer_id: Some(77),
            contact_email: Some("jo@example.com".to_string()),
            line_items: lines,
            billing_address: None,
            shipping_address: None,
            gateway: Some("stripe".to_string()),
            note: None,
            shipping_lines: vec![],
            tax_lines: vec![],
            refunds: vec![],
            created_at: None,
        }
    }

    fn seeded_store() -> CorrelationStore {
        let store = CorrelationStore::in_memory();
        store.put(EntityKind::Product, "1001", "wc-p-1", "fp");
        store.put(EntityKind::Variant, "11", "wc-v-1", "fp");
        store.put(EntityKind::Customer, "77", "wc-c-7", "fp");
        store
    }

    #[test]
    fn test_line_items_resolve_variant_and_product() {
        let store = seeded_store();
        let mapped = map_order(&order(vec![line(1, 1001, 11)]), &store).unwrap();
        let item = &mapped.entity.line_items[0];
        assert_eq!(item.product_id.as_deref(), Some("wc-p-1"));
        assert_eq!(item.variation_id.as_deref(), Some("wc-v-1"));
        assert_eq!(item.total, "39.98");
        assert_eq!(mapped.entity.customer_id, "wc-c-7");
        assert!(mapped.entity.set_paid);
    }

    #[test]
    fn test_unresolved_variant_defers_order() {
        let store = CorrelationStore::in_memory();
        store.put(EntityKind::Product, "1001", "wc-p-1", "fp");
        let err = map_order(&order(vec![line(1, 1001, 11)]), &store).unwrap_err();
        assert_eq!(err, MapError::unresolved(EntityKind::Variant, 11));
    }

    #[test]
    fn test_simple_product_line_has_no_variation_ref() {
        let store = CorrelationStore::in_memory();
        store.put(EntityKind::Customer, "77", "wc-c-7", "fp");
        store.put(EntityKind::Product, "200", "wc-p-9", "fp");
        // The sole implicit variant of a simple product correlates to the
        // product id itself.
        store.put(EntityKind::Variant, "21", "wc-p-9", "fp");

        let mapped = map_order(&order(vec![line(1, 200, 21)]), &store).unwrap();
        let item = &mapped.entity.line_items[0];
        assert_eq!(item.product_id.as_deref(), Some("wc-p-9"));
        assert!(item.variation_id.is_none());
    }

    #[test]
    fn test_unknown_customer_falls_back_to_guest() {
        let store = seeded_store();
        let mut src = order(vec![line(1, 1001, 11)]);
        src.customer_id = Some(404);
        let mapped = map_order(&src, &store).unwrap();
        assert_eq!(mapped.entity.customer_id, "0");
        assert_eq!(mapped.warnings.len(), 1);
        assert!(mapped.warnings[0].contains("guest"));
    }

    #[test]
    fn test_status_table() {
        let store = seeded_store();
        let mut src = order(vec![]);

        src.fulfillment_status = Some("fulfilled".to_string());
        assert_eq!(map_order(&src, &store).unwrap().entity.status, "completed");

        src.fulfillment_status = None;
        src.financial_status = Some("voided".to_string());
        assert_eq!(map_order(&src, &store).unwrap().entity.status, "cancelled");

        src.financial_status = Some("refunded".to_string());
        assert_eq!(map_order(&src, &store).unwrap().entity.status, "refunded");

        src.financial_status = None;
        assert_eq!(map_order(&src, &store).unwrap().entity.status, "pending");
    }

    #[test]
    fn test_refunds_attach_to_order_lines() {
        let store = seeded_store();
        let mut src = order(vec![line(1, 1001, 11)]);
        src.refunds = vec![SourceRefund {
            id: 1,
            refund_line_items: vec![SourceRefundLine {
                line_item_id: 1,
                quantity: 1,
                subtotal: "19.99".to_string(),
            }],
        }];
        let mapped = map_order(&src, &store).unwrap();
        assert_eq!(mapped.entity.refunds.len(), 1);
        assert_eq!(mapped.entity.refunds[0].line_item_ref, "1");
        assert_eq!(mapped.entity.refunds[0].amount, "19.99");
    }

    #[test]
    fn test_custom_line_item_kept_with_warning() {
        let store = seeded_store();
        let mut src = order(vec![]);
        src.line_items = vec![SourceLineItem {
            id: 5,
            variant_id: None,
            product_id: None,
            title: Some("Gift wrap".to_string()),
            quantity: 1,
            price: "3.00".to_string(),
        }];
        let mapped = map_order(&src, &store).unwrap();
        assert_eq!(mapped.entity.line_items.len(), 1);
        assert!(mapped.entity.line_items[0].product_id.is_none());
        assert_eq!(mapped.warnings.len(), 1);
    }

    #[test]
    fn test_bad_price_is_invalid() {
        let store = seeded_store();
        let mut src = order(vec![line(1, 1001, 11)]);
        src.line_items[0].price = "free".to_string();
        assert!(matches!(
            map_order(&src, &store),
            Err(MapError::Invalid(_))
        ));
    }
}
