//! Coupon (discount code) mapping.

use super::{MapError, MapResult, Mapped};
use crate::correlation::ResolveTargetId;
use crate::entities::source::SourceCoupon;
use crate::entities::target::{MetaData, TargetCoupon};
use crate::entities::EntityKind;

/// Map a source discount code to a target coupon, best effort.
///
/// Restrictions the target cannot express — and entitled product/collection
/// references that never got a correlation record — are recorded as warnings
/// and omitted; they never fail the coupon.
pub fn map_coupon(src: &SourceCoupon, resolver: &dyn ResolveTargetId) -> MapResult<TargetCoupon> {
    if src.code.is_empty() {
        return Err(MapError::Invalid("coupon has no code".into()));
    }

    let mut warnings = Vec::new();

    let (discount_type, free_shipping) = match src.value_type.as_str() {
        "percentage" => ("percent", false),
        "fixed_amount" => ("fixed_cart", false),
        "shipping" => ("fixed_cart", true),
        other => {
            warnings.push(format!(
                "coupon {}: unsupported value type '{}', defaulting to fixed_cart",
                src.code, other
            ));
            ("fixed_cart", false)
        }
    };

    // Percentage values arrive signed ("-10.0" means 10% off).
    let amount = src.value.trim_start_matches('-').to_string();

    let mut product_ids = Vec::new();
    for product_id in &src.entitled_product_ids {
        match resolver.resolve(EntityKind::Product, &product_id.to_string()) {
            Some(id) => product_ids.push(id),
            None => warnings.push(format!(
                "coupon {}: entitled product {} not migrated, restriction omitted",
                src.code, product_id
            )),
        }
    }

    let mut product_categories = Vec::new();
    for collection_id in &src.entitled_collection_ids {
        match resolver.resolve(EntityKind::Category, &collection_id.to_string()) {
            Some(id) => product_categories.push(id),
            None => warnings.push(format!(
                "coupon {}: entitled collection {} not migrated, restriction omitted",
                src.code, collection_id
            )),
        }
    }

    for restriction in &src.other_restrictions {
        warnings.push(format!(
            "coupon {}: unsupported restriction '{}' omitted",
            src.code, restriction
        ));
    }

    let entity = TargetCoupon {
        code: src.code.clone(),
        discount_type: discount_type.to_string(),
        amount,
        minimum_amount: src.minimum_order_amount.clone(),
        usage_limit: src.usage_limit,
        usage_count: src.used_count,
        date_expires: src.ends_at.map(|t| t.to_rfc3339()),
        free_shipping,
        product_ids,
        product_categories,
        meta_data: vec![MetaData::new("_source_discount_id", src.id.to_string())],
    };

    Ok(Mapped { entity, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationStore;

    fn coupon(value_type: &str, value: &str) -> SourceCoupon {
        SourceCoupon {
            id: 300,
            code: "SUMMER10".to_string(),
            value_type: value_type.to_string(),
            value: value.to_string(),
            minimum_order_amount: Some("50.00".to_string()),
            usage_limit: Some(100),
            used_count: 3,
            ends_at: None,
            entitled_product_ids: vec![],
            entitled_collection_ids: vec![],
            other_restrictions: vec![],
        }
    }

    #[test]
    fn test_percentage_maps_to_percent_unsigned() {
        let store = CorrelationStore::in_memory();
        let mapped = map_coupon(&coupon("percentage", "-10.0"), &store).unwrap();
        assert_eq!(mapped.entity.discount_type, "percent");
        assert_eq!(mapped.entity.amount, "10.0");
        assert!(!mapped.entity.free_shipping);
    }

    #[test]
    fn test_shipping_coupon_sets_free_shipping() {
        let store = CorrelationStore::in_memory();
        let mapped = map_coupon(&coupon("shipping", "0.0"), &store).unwrap();
        assert!(mapped.entity.free_shipping);
    }

    #[test]
    fn test_unknown_type_warns_and_defaults() {
        let store = CorrelationStore::in_memory();
        let mapped = map_coupon(&coupon("bogo", "1.0"), &store).unwrap();
        assert_eq!(mapped.entity.discount_type, "fixed_cart");
        assert_eq!(mapped.warnings.len(), 1);
    }

    #[test]
    fn test_unresolved_restriction_omitted_with_warning() {
        let store = CorrelationStore::in_memory();
        store.put(EntityKind::Product, "1", "wc-p-1", "fp");
        let mut src = coupon("fixed_amount", "5.00");
        src.entitled_product_ids = vec![1, 2];
        let mapped = map_coupon(&src, &store).unwrap();
        assert_eq!(mapped.entity.product_ids, vec!["wc-p-1".to_string()]);
        assert_eq!(mapped.warnings.len(), 1);
        assert!(mapped.warnings[0].contains("restriction omitted"));
    }

    #[test]
    fn test_unsupported_restrictions_never_fail_coupon() {
        let store = CorrelationStore::in_memory();
        let mut src = coupon("fixed_amount", "5.00");
        src.other_restrictions = vec!["first_order_only".to_string()];
        let mapped = map_coupon(&src, &store).unwrap();
        assert_eq!(mapped.warnings.len(), 1);
        assert_eq!(mapped.entity.code, "SUMMER10");
    }
}
