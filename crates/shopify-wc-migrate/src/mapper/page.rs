//! Content page mapping.

use super::{MapError, MapResult, Mapped};
use crate::entities::source::SourcePage;
use crate::entities::target::{MetaData, TargetPage};

pub fn map_page(src: &SourcePage) -> MapResult<TargetPage> {
    if src.title.is_empty() {
        return Err(MapError::Invalid("page has no title".into()));
    }

    Ok(Mapped::new(TargetPage {
        title: src.title.clone(),
        slug: src.handle.clone().filter(|h| !h.is_empty()),
        content: src.body_html.clone().unwrap_or_default(),
        status: "publish".to_string(),
        meta_data: vec![MetaData::new("_source_page_id", src.id.to_string())],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_maps_title_slug_body() {
        let src = SourcePage {
            id: 5,
            title: "About us".to_string(),
            body_html: Some("<h1>Hi</h1>".to_string()),
            handle: Some("about-us".to_string()),
        };
        let mapped = map_page(&src).unwrap();
        assert_eq!(mapped.entity.title, "About us");
        assert_eq!(mapped.entity.slug.as_deref(), Some("about-us"));
        assert_eq!(mapped.entity.content, "<h1>Hi</h1>");
        assert_eq!(mapped.entity.status, "publish");
    }

    #[test]
    fn test_untitled_page_invalid() {
        let src = SourcePage {
            id: 6,
            title: String::new(),
            body_html: None,
            handle: None,
        };
        assert!(matches!(map_page(&src), Err(MapError::Invalid(_))));
    }
}
