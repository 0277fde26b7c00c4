//! Pure source → target entity transforms.
//!
//! Every mapping function is side-effect free: cross-entity references are
//! resolved through a [`ResolveTargetId`] view of the correlation data, and
//! non-fatal findings are returned as warnings on the [`Mapped`] result
//! rather than logged here.

mod category;
mod coupon;
mod customer;
mod order;
mod page;
mod product;

pub use category::map_category;
pub use coupon::map_coupon;
pub use customer::map_customer;
pub use order::map_order;
pub use page::map_page;
pub use product::map_product;

use crate::entities::source::SourceAddress;
use crate::entities::target::TargetAddress;
use crate::entities::EntityKind;

/// A mapped target entity plus the non-fatal warnings gathered on the way.
#[derive(Debug, Clone)]
pub struct Mapped<T> {
    pub entity: T,
    pub warnings: Vec<String>,
}

impl<T> Mapped<T> {
    pub fn new(entity: T) -> Self {
        Self {
            entity,
            warnings: Vec::new(),
        }
    }
}

/// Why a mapping could not produce a target entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// A prerequisite entity (e.g. a parent category) has no correlation
    /// record yet. The orchestrator defers and retries within the phase.
    DependencyNotReady {
        kind: EntityKind,
        source_id: String,
    },

    /// A cross-entity reference (e.g. an order line's variant) has no
    /// correlation record. Deferred like `DependencyNotReady`.
    UnresolvedReference {
        kind: EntityKind,
        source_id: String,
    },

    /// The source payload is malformed. Entity-level failure, not retried.
    Invalid(String),
}

impl MapError {
    pub fn dependency(kind: EntityKind, source_id: impl ToString) -> Self {
        MapError::DependencyNotReady {
            kind,
            source_id: source_id.to_string(),
        }
    }

    pub fn unresolved(kind: EntityKind, source_id: impl ToString) -> Self {
        MapError::UnresolvedReference {
            kind,
            source_id: source_id.to_string(),
        }
    }
}

pub type MapResult<T> = std::result::Result<Mapped<T>, MapError>;

/// Strip HTML tags and collapse whitespace.
pub(crate) fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive a meta description from HTML body content, truncated at a word
/// boundary around `max_length` characters.
pub(crate) fn extract_meta_description(html: &str, max_length: usize) -> String {
    let clean = strip_html(html);
    if clean.len() <= max_length {
        return clean;
    }
    let mut end = max_length.min(clean.len());
    while !clean.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &clean[..end];
    match truncated.rsplit_once(' ') {
        Some((head, _)) => format!("{}...", head),
        None => format!("{}...", truncated),
    }
}

/// Convert a weight to kilograms and render it as the target expects.
pub(crate) fn weight_kg_string(weight: f64, unit: &str) -> String {
    let kg = match unit {
        "g" => weight / 1000.0,
        "lb" => weight * 0.453_592_37,
        "oz" => weight * 0.028_349_523_125,
        _ => weight,
    };
    let rounded = (kg * 1000.0).round() / 1000.0;
    let mut s = format!("{:.3}", rounded);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

/// Build a target address block from a source address, falling back to
/// customer-level contact fields where the address is silent.
pub(crate) fn target_address(
    addr: Option<&SourceAddress>,
    fallback_first: Option<&str>,
    fallback_last: Option<&str>,
    email: Option<&str>,
    fallback_phone: Option<&str>,
) -> TargetAddress {
    let empty = SourceAddress::default();
    let addr = addr.unwrap_or(&empty);
    TargetAddress {
        first_name: addr
            .first_name
            .as_deref()
            .or(fallback_first)
            .unwrap_or_default()
            .to_string(),
        last_name: addr
            .last_name
            .as_deref()
            .or(fallback_last)
            .unwrap_or_default()
            .to_string(),
        company: addr.company.clone().unwrap_or_default(),
        address_1: addr.address1.clone().unwrap_or_default(),
        address_2: addr.address2.clone().unwrap_or_default(),
        city: addr.city.clone().unwrap_or_default(),
        state: addr.province.clone().unwrap_or_default(),
        postcode: addr.zip.clone().unwrap_or_default(),
        country: addr.country_code.clone().unwrap_or_default(),
        email: email.map(str::to_string),
        phone: addr
            .phone
            .as_deref()
            .or(fallback_phone)
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Soft  <b>cotton</b> tee</p>"),
            "Soft cotton tee"
        );
        assert_eq!(strip_html("plain"), "plain");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_extract_meta_description_truncates_on_word() {
        let html = "<p>The quick brown fox jumps over the lazy dog repeatedly</p>";
        let desc = extract_meta_description(html, 20);
        assert!(desc.ends_with("..."));
        assert!(desc.len() <= 24);
        assert!(!desc.contains('<'));
    }

    #[test]
    fn test_extract_meta_description_short_passthrough() {
        assert_eq!(extract_meta_description("<p>Short.</p>", 160), "Short.");
    }

    #[test]
    fn test_weight_conversion() {
        assert_eq!(weight_kg_string(1.5, "kg"), "1.5");
        assert_eq!(weight_kg_string(500.0, "g"), "0.5");
        assert_eq!(weight_kg_string(1.0, "lb"), "0.454");
        assert_eq!(weight_kg_string(0.0, "kg"), "0");
    }
}
