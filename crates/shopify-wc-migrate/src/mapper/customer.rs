//! Customer mapping.

use super::{target_address, MapResult, Mapped};
use crate::entities::source::{AddressRole, SourceAddress, SourceCustomer};
use crate::entities::target::{MetaData, TargetCustomer};

/// Map a source customer to a target customer account.
///
/// The target keeps exactly one billing and one shipping address; when the
/// source carries several of a role, the most recently updated one wins and
/// the discarded ones are reported as informational warnings. An address
/// without a role tag is a candidate for both blocks.
pub fn map_customer(src: &SourceCustomer) -> MapResult<TargetCustomer> {
    let mut warnings = Vec::new();

    let email = match src.email.as_deref().filter(|e| !e.is_empty()) {
        Some(email) => email.to_string(),
        None => {
            let placeholder = format!("customer-{}@migrated.invalid", src.id);
            warnings.push(format!(
                "customer {} has no email; using placeholder {}",
                src.id, placeholder
            ));
            placeholder
        }
    };
    let username = email.split('@').next().unwrap_or(&email).to_string();

    let billing = pick_address(src, AddressRole::Billing, &mut warnings);
    let shipping = pick_address(src, AddressRole::Shipping, &mut warnings);

    let entity = TargetCustomer {
        email: email.clone(),
        first_name: src.first_name.clone().unwrap_or_default(),
        last_name: src.last_name.clone().unwrap_or_default(),
        username,
        billing: target_address(
            billing,
            src.first_name.as_deref(),
            src.last_name.as_deref(),
            Some(&email),
            src.phone.as_deref(),
        ),
        shipping: target_address(
            shipping,
            src.first_name.as_deref(),
            src.last_name.as_deref(),
            None,
            src.phone.as_deref(),
        ),
        meta_data: vec![MetaData::new("_source_customer_id", src.id.to_string())],
    };

    Ok(Mapped { entity, warnings })
}

/// Most recently updated address for a role; untagged addresses qualify
/// for every role.
fn pick_address<'a>(
    src: &'a SourceCustomer,
    role: AddressRole,
    warnings: &mut Vec<String>,
) -> Option<&'a SourceAddress> {
    let mut candidates: Vec<&SourceAddress> = src
        .addresses
        .iter()
        .filter(|a| a.role.is_none() || a.role == Some(role))
        .collect();
    if candidates.len() > 1 {
        candidates.sort_by_key(|a| a.updated_at);
        let kept = candidates.last().copied();
        for dropped in &candidates[..candidates.len() - 1] {
            // Only tagged duplicates are worth a note; untagged addresses
            // losing to a tagged one is the normal case.
            if dropped.role == Some(role) {
                warnings.push(format!(
                    "customer {}: discarding older {:?} address ({})",
                    src.id,
                    role,
                    dropped.city.as_deref().unwrap_or("no city")
                ));
            }
        }
        return kept;
    }
    candidates.pop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn address(role: Option<AddressRole>, city: &str, year: i32) -> SourceAddress {
        SourceAddress {
            city: Some(city.to_string()),
            role,
            updated_at: Some(Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    fn customer(addresses: Vec<SourceAddress>) -> SourceCustomer {
        SourceCustomer {
            id: 77,
            email: Some("jo@example.com".to_string()),
            first_name: Some("Jo".to_string()),
            last_name: Some("Dane".to_string()),
            phone: None,
            addresses,
        }
    }

    #[test]
    fn test_roles_partitioned() {
        let src = customer(vec![
            address(Some(AddressRole::Billing), "Lyon", 2023),
            address(Some(AddressRole::Shipping), "Paris", 2023),
        ]);
        let mapped = map_customer(&src).unwrap();
        assert_eq!(mapped.entity.billing.city, "Lyon");
        assert_eq!(mapped.entity.shipping.city, "Paris");
        assert!(mapped.warnings.is_empty());
    }

    #[test]
    fn test_most_recent_same_role_wins_with_warning() {
        let src = customer(vec![
            address(Some(AddressRole::Billing), "Old Town", 2020),
            address(Some(AddressRole::Billing), "New Town", 2024),
        ]);
        let mapped = map_customer(&src).unwrap();
        assert_eq!(mapped.entity.billing.city, "New Town");
        assert_eq!(mapped.warnings.len(), 1);
        assert!(mapped.warnings[0].contains("Old Town"));
    }

    #[test]
    fn test_untagged_address_serves_both_roles() {
        let src = customer(vec![address(None, "Berlin", 2023)]);
        let mapped = map_customer(&src).unwrap();
        assert_eq!(mapped.entity.billing.city, "Berlin");
        assert_eq!(mapped.entity.shipping.city, "Berlin");
    }

    #[test]
    fn test_missing_email_gets_placeholder() {
        let mut src = customer(vec![]);
        src.email = None;
        let mapped = map_customer(&src).unwrap();
        assert_eq!(mapped.entity.email, "customer-77@migrated.invalid");
        assert_eq!(mapped.warnings.len(), 1);
    }

    #[test]
    fn test_username_from_email_local_part() {
        let mapped = map_customer(&customer(vec![])).unwrap();
        assert_eq!(mapped.entity.username, "jo");
        assert_eq!(mapped.entity.billing.email.as_deref(), Some("jo@example.com"));
    }
}
