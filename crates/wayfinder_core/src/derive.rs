use crate::constants::links::GLOBAL_ASSET_ID;
use crate::error::DiscoveryError;
use crate::model::{AssetLink, SpecificAssetId};

use std::collections::BTreeSet;

/// Projects a shell's identifiers onto the set of links it can be discovered by.
///
/// Names and values are taken as-is. A `global_asset_id` adds a synthetic
/// `("globalAssetId", id)` link; at most one such link may result.
pub fn derive_asset_links(
    identifiers: &[SpecificAssetId],
    global_asset_id: Option<&str>,
) -> Result<BTreeSet<AssetLink>, DiscoveryError> {
    let mut links = BTreeSet::new();

    for (position, identifier) in identifiers.iter().enumerate() {
        if identifier.name.is_empty() {
            return Err(DiscoveryError::MalformedIdentifier(format!(
                "identifier at position {position} has no name"
            )));
        }
        links.insert(identifier.to_link());
    }

    if let Some(global) = global_asset_id {
        links.insert(AssetLink::new(GLOBAL_ASSET_ID, global));
    }

    let globals = links
        .iter()
        .filter(|link| link.name == GLOBAL_ASSET_ID)
        .count();
    if globals > 1 {
        return Err(DiscoveryError::MalformedIdentifier(format!(
            "'{GLOBAL_ASSET_ID}' is reserved and may only be bound to one value, found {globals}"
        )));
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(pairs: &[(&str, &str)]) -> Vec<SpecificAssetId> {
        pairs
            .iter()
            .map(|(name, value)| SpecificAssetId::new(*name, *value))
            .collect()
    }

    #[test]
    fn derives_one_link_per_identifier() {
        let links = derive_asset_links(&ids(&[("a", "1"), ("b", "2")]), None).unwrap();

        assert_eq!(
            links.into_iter().collect::<Vec<_>>(),
            vec![AssetLink::new("a", "1"), AssetLink::new("b", "2")]
        );
    }

    #[test]
    fn keeps_whitespace_and_case() {
        let links = derive_asset_links(&ids(&[(" Serial ", " X1 ")]), None).unwrap();

        assert!(links.contains(&AssetLink::new(" Serial ", " X1 ")));
    }

    #[test]
    fn same_name_different_values_coexist() {
        let links = derive_asset_links(&ids(&[("part", "1"), ("part", "2")]), None).unwrap();

        assert_eq!(links.len(), 2);
    }

    #[test]
    fn duplicate_pairs_collapse() {
        let links = derive_asset_links(&ids(&[("part", "1"), ("part", "1")]), None).unwrap();

        assert_eq!(links.len(), 1);
    }

    #[test]
    fn adds_synthetic_global_link() {
        let links = derive_asset_links(&ids(&[("a", "1")]), Some("urn:asset:42")).unwrap();

        assert!(links.contains(&AssetLink::new(GLOBAL_ASSET_ID, "urn:asset:42")));
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_set() {
        assert!(derive_asset_links(&[], None).unwrap().is_empty());
    }

    #[test]
    fn explicit_global_identifier_matching_the_global_id_is_accepted() {
        let links =
            derive_asset_links(&ids(&[(GLOBAL_ASSET_ID, "urn:g")]), Some("urn:g")).unwrap();

        assert_eq!(links.len(), 1);
    }

    #[test]
    fn conflicting_global_links_are_rejected() {
        let err = derive_asset_links(&ids(&[(GLOBAL_ASSET_ID, "urn:a")]), Some("urn:b"))
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::MalformedIdentifier(_)));
    }

    #[test]
    fn unnamed_identifier_is_rejected() {
        let err = derive_asset_links(&ids(&[("a", "1"), ("", "2")]), None).unwrap_err();

        assert!(matches!(err, DiscoveryError::MalformedIdentifier(msg) if msg.contains("position 1")));
    }
}
