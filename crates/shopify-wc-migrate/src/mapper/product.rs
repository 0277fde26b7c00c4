//! Product and variant mapping.

use super::{extract_meta_description, weight_kg_string, MapError, MapResult, Mapped};
use crate::correlation::ResolveTargetId;
use crate::entities::source::{SourceProduct, SourceVariant};
use crate::entities::target::{
    MetaData, TargetAttribute, TargetCategoryRef, TargetImage, TargetProduct, TargetTag,
    TargetVariation, TargetVariationAttribute,
};
use crate::entities::EntityKind;

/// Map a source product, its option axes and its variants onto a target
/// product with an attribute set and a variation list.
///
/// One attribute is created per distinct option axis across the product and
/// reused by every variation. A product whose sole variant carries no option
/// values becomes a simple product with sku/price/stock/weight inlined.
pub fn map_product(
    src: &SourceProduct,
    resolver: &dyn ResolveTargetId,
) -> MapResult<TargetProduct> {
    if src.title.is_empty() {
        return Err(MapError::Invalid("product has no title".into()));
    }
    let Some(first_variant) = src.variants.first() else {
        return Err(MapError::Invalid("product has no variants".into()));
    };

    // Category references must already be migrated (categories phase runs
    // first); a gap defers this product rather than dropping the link.
    let mut categories = Vec::with_capacity(src.collection_ids.len());
    for collection_id in &src.collection_ids {
        let id = resolver
            .resolve(EntityKind::Category, &collection_id.to_string())
            .ok_or_else(|| MapError::dependency(EntityKind::Category, collection_id))?;
        categories.push(TargetCategoryRef { id });
    }

    let mut images: Vec<TargetImage> = src
        .images
        .iter()
        .map(|img| TargetImage {
            src: img.src.clone(),
            alt: img.alt.clone(),
            position: img.position,
        })
        .collect();
    images.sort_by_key(|img| img.position);

    let tags = src
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| TargetTag { name: t.to_string() })
        .collect();

    let description = src.body_html.clone().unwrap_or_default();
    let status = match src.status.as_deref() {
        Some("active") => "publish",
        _ => "draft",
    };

    let mut meta_data = vec![MetaData::new("_source_product_id", src.id.to_string())];
    meta_data.push(MetaData::new(
        "_seo_title",
        src.seo_title.clone().unwrap_or_else(|| src.title.clone()),
    ));
    meta_data.push(MetaData::new(
        "_seo_description",
        src.seo_description
            .clone()
            .unwrap_or_else(|| extract_meta_description(&description, 160)),
    ));

    let is_variable = src.variants.len() > 1;

    let mut product = TargetProduct {
        name: src.title.clone(),
        product_type: if is_variable { "variable" } else { "simple" }.to_string(),
        description,
        status: status.to_string(),
        sku: None,
        regular_price: None,
        manage_stock: true,
        stock_quantity: None,
        stock_status: stock_status(first_variant).to_string(),
        weight: None,
        categories,
        images,
        attributes: Vec::new(),
        variations: Vec::new(),
        tags,
        meta_data,
    };

    if is_variable {
        product.attributes = build_attributes(src);
        product.variations = src
            .variants
            .iter()
            .map(|v| build_variation(src, v))
            .collect();
        let any_in_stock = src.variants.iter().any(|v| v.inventory_quantity > 0);
        product.stock_status = if any_in_stock { "instock" } else { "outofstock" }.to_string();
    } else {
        product.sku = first_variant.sku.clone().filter(|s| !s.is_empty());
        product.regular_price = Some(first_variant.price.clone());
        product.stock_quantity = Some(first_variant.inventory_quantity);
        product.weight = Some(weight_kg_string(
            first_variant.weight,
            &first_variant.weight_unit,
        ));
    }

    Ok(Mapped::new(product))
}

fn stock_status(variant: &SourceVariant) -> &'static str {
    if variant.inventory_quantity > 0 {
        "instock"
    } else {
        "outofstock"
    }
}

/// One attribute per option axis; option values collected across variants
/// in first-seen order.
fn build_attributes(src: &SourceProduct) -> Vec<TargetAttribute> {
    src.options
        .iter()
        .enumerate()
        .map(|(axis, option)| {
            let mut values: Vec<String> = Vec::new();
            for variant in &src.variants {
                if let Some(value) = axis_value(variant, axis) {
                    if !values.iter().any(|v| v == value) {
                        values.push(value.to_string());
                    }
                }
            }
            TargetAttribute {
                name: option.name.clone(),
                position: axis as i32,
                visible: true,
                variation: true,
                options: values,
            }
        })
        .collect()
}

fn build_variation(src: &SourceProduct, variant: &SourceVariant) -> TargetVariation {
    let attributes = src
        .options
        .iter()
        .enumerate()
        .filter_map(|(axis, option)| {
            axis_value(variant, axis).map(|value| TargetVariationAttribute {
                name: option.name.clone(),
                option: value.to_string(),
            })
        })
        .collect();

    TargetVariation {
        source_variant_id: variant.id.to_string(),
        sku: variant.sku.clone().filter(|s| !s.is_empty()),
        regular_price: variant.price.clone(),
        manage_stock: true,
        stock_quantity: variant.inventory_quantity,
        weight: Some(weight_kg_string(variant.weight, &variant.weight_unit)),
        attributes,
    }
}

/// Positional option value for an axis index.
fn axis_value(variant: &SourceVariant, axis: usize) -> Option<&str> {
    match axis {
        0 => variant.option1.as_deref(),
        1 => variant.option2.as_deref(),
        2 => variant.option3.as_deref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationStore;
    use crate::entities::source::{SourceImage, SourceOption};

    fn variant(id: u64, sku: &str, size: &str, color: &str) -> SourceVariant {
        SourceVariant {
            id,
            sku: Some(sku.to_string()),
            price: "19.99".to_string(),
            inventory_quantity: 5,
            weight: 0.2,
            weight_unit: "kg".to_string(),
            option1: Some(size.to_string()),
            option2: Some(color.to_string()),
            option3: None,
        }
    }

    fn two_variant_product() -> SourceProduct {
        SourceProduct {
            id: 1001,
            title: "Tee".to_string(),
            body_html: Some("<p>A very soft tee.</p>".to_string()),
            handle: Some("tee".to_string()),
            status: Some("active".to_string()),
            tags: Some("summer, cotton".to_string()),
            vendor: None,
            options: vec![
                SourceOption {
                    name: "Size".to_string(),
                    position: 1,
                },
                SourceOption {
                    name: "Color".to_string(),
                    position: 2,
                },
            ],
            variants: vec![variant(11, "A1", "S", "Red"), variant(12, "A2", "S", "Blue")],
            images: vec![
                SourceImage {
                    id: Some(2),
                    src: "https://cdn/b.jpg".to_string(),
                    alt: None,
                    position: 2,
                },
                SourceImage {
                    id: Some(1),
                    src: "https://cdn/a.jpg".to_string(),
                    alt: Some("front".to_string()),
                    position: 1,
                },
            ],
            collection_ids: vec![],
            seo_title: None,
            seo_description: None,
        }
    }

    #[test]
    fn test_two_variants_share_attribute_pair_and_keep_skus() {
        let store = CorrelationStore::in_memory();
        let mapped = map_product(&two_variant_product(), &store).unwrap();
        let product = mapped.entity;

        assert_eq!(product.product_type, "variable");
        assert_eq!(product.attributes.len(), 2);
        assert_eq!(product.attributes[0].name, "Size");
        assert_eq!(product.attributes[0].options, vec!["S"]);
        assert_eq!(product.attributes[1].name, "Color");
        assert_eq!(product.attributes[1].options, vec!["Red", "Blue"]);

        assert_eq!(product.variations.len(), 2);
        assert_eq!(product.variations[0].sku.as_deref(), Some("A1"));
        assert_eq!(product.variations[1].sku.as_deref(), Some("A2"));
        for variation in &product.variations {
            assert_eq!(variation.attributes.len(), 2);
            assert_eq!(variation.attributes[0].name, "Size");
            assert_eq!(variation.attributes[1].name, "Color");
        }
    }

    #[test]
    fn test_single_variant_is_simple_product() {
        let mut src = two_variant_product();
        src.variants.truncate(1);
        let store = CorrelationStore::in_memory();
        let product = map_product(&src, &store).unwrap().entity;

        assert_eq!(product.product_type, "simple");
        assert_eq!(product.sku.as_deref(), Some("A1"));
        assert_eq!(product.regular_price.as_deref(), Some("19.99"));
        assert_eq!(product.stock_quantity, Some(5));
        assert!(product.variations.is_empty());
    }

    #[test]
    fn test_images_ordered_first_is_featured() {
        let store = CorrelationStore::in_memory();
        let product = map_product(&two_variant_product(), &store).unwrap().entity;
        assert_eq!(product.images[0].src, "https://cdn/a.jpg");
        assert_eq!(product.images[1].src, "https://cdn/b.jpg");
    }

    #[test]
    fn test_unmigrated_collection_defers_product() {
        let mut src = two_variant_product();
        src.collection_ids = vec![900];
        let store = CorrelationStore::in_memory();
        let err = map_product(&src, &store).unwrap_err();
        assert_eq!(err, MapError::dependency(EntityKind::Category, 900));
    }

    #[test]
    fn test_migrated_collection_resolves() {
        let mut src = two_variant_product();
        src.collection_ids = vec![900];
        let store = CorrelationStore::in_memory();
        store.put(EntityKind::Category, "900", "wc-cat-4", "fp");
        let product = map_product(&src, &store).unwrap().entity;
        assert_eq!(product.categories[0].id, "wc-cat-4");
    }

    #[test]
    fn test_tags_split_and_status_mapped() {
        let store = CorrelationStore::in_memory();
        let mut src = two_variant_product();
        src.status = Some("archived".to_string());
        let product = map_product(&src, &store).unwrap().entity;
        assert_eq!(product.status, "draft");
        assert_eq!(product.tags.len(), 2);
        assert_eq!(product.tags[0].name, "summer");
    }

    #[test]
    fn test_empty_product_rejected() {
        let mut src = two_variant_product();
        src.variants.clear();
        let store = CorrelationStore::in_memory();
        assert!(matches!(
            map_product(&src, &store),
            Err(MapError::Invalid(_))
        ));
    }
}
