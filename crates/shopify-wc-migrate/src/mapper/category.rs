//! Category (collection) mapping.

use super::{MapError, MapResult, Mapped};
use crate::correlation::ResolveTargetId;
use crate::entities::source::SourceCategory;
use crate::entities::target::{MetaData, TargetCategory};
use crate::entities::EntityKind;

/// Map a source collection to a target category node.
///
/// The parent reference is resolved through the correlation view; a parent
/// without a record yet yields `DependencyNotReady` so the orchestrator can
/// retry after the parent lands.
pub fn map_category(
    src: &SourceCategory,
    resolver: &dyn ResolveTargetId,
) -> MapResult<TargetCategory> {
    if src.title.is_empty() {
        return Err(MapError::Invalid("category has no title".into()));
    }

    let parent = match src.parent_id {
        Some(parent_id) => Some(
            resolver
                .resolve(EntityKind::Category, &parent_id.to_string())
                .ok_or_else(|| MapError::dependency(EntityKind::Category, parent_id))?,
        ),
        None => None,
    };

    Ok(Mapped::new(TargetCategory {
        name: src.title.clone(),
        slug: src.handle.clone().filter(|h| !h.is_empty()),
        description: src.body_html.clone().unwrap_or_default(),
        parent,
        meta_data: vec![MetaData::new("_source_collection_id", src.id.to_string())],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationStore;

    fn category(id: u64, title: &str, parent_id: Option<u64>) -> SourceCategory {
        SourceCategory {
            id,
            title: title.to_string(),
            handle: Some(title.to_lowercase()),
            body_html: None,
            parent_id,
        }
    }

    #[test]
    fn test_root_category_has_no_parent() {
        let store = CorrelationStore::in_memory();
        let mapped = map_category(&category(1, "Apparel", None), &store).unwrap();
        assert_eq!(mapped.entity.name, "Apparel");
        assert!(mapped.entity.parent.is_none());
    }

    #[test]
    fn test_child_resolves_migrated_parent() {
        let store = CorrelationStore::in_memory();
        store.put(EntityKind::Category, "1", "wc-10", "fp");
        let mapped = map_category(&category(2, "Shirts", Some(1)), &store).unwrap();
        assert_eq!(mapped.entity.parent.as_deref(), Some("wc-10"));
    }

    #[test]
    fn test_child_with_unmigrated_parent_defers() {
        let store = CorrelationStore::in_memory();
        let err = map_category(&category(2, "Shirts", Some(1)), &store).unwrap_err();
        assert_eq!(err, MapError::dependency(EntityKind::Category, 1));
    }

    #[test]
    fn test_untitled_category_invalid() {
        let store = CorrelationStore::in_memory();
        let err = map_category(&category(3, "", None), &store).unwrap_err();
        assert!(matches!(err, MapError::Invalid(_)));
    }
}
