use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An indexable `(name, value)` pair.
///
/// Equality is exact and case-sensitive on both fields. The derived ordering (name, then value)
/// gives link sets a deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetLink {
    pub name: String,
    pub value: String,
}

impl AssetLink {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceTypes {
    ExternalReference,
    ModelReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// An AAS reference, carried as identifier metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(rename = "type")]
    pub kind: ReferenceTypes,
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_semantic_id: Option<Box<Reference>>,
}

/// A client-supplied asset identifier.
///
/// Only `name` and `value` take part in indexing, the remaining fields are stored and returned
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificAssetId {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_subject_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supplemental_semantic_ids: Vec<Reference>,
}

impl SpecificAssetId {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            external_subject_id: None,
            semantic_id: None,
            supplemental_semantic_ids: Vec::new(),
        }
    }

    pub fn to_link(&self) -> AssetLink {
        AssetLink::new(&self.name, &self.value)
    }
}

/// The asset information of a shell, as seen by a repository or registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_asset_id: Option<String>,
    #[serde(default)]
    pub specific_asset_ids: Vec<SpecificAssetId>,
}

/// The index entry owned by one shell.
///
/// `asset_links` is always derived from `identifiers` (see
/// [`derive_asset_links`](crate::derive::derive_asset_links)) and never edited on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDocument {
    pub shell_id: String,
    pub asset_links: BTreeSet<AssetLink>,
    pub identifiers: Vec<SpecificAssetId>,
}

impl DiscoveryDocument {
    /// Returns `true` if the document carries at least one of `links`.
    pub fn matches_any<'a>(&self, links: impl IntoIterator<Item = &'a AssetLink>) -> bool {
        links.into_iter().any(|link| self.asset_links.contains(link))
    }

    /// Returns `true` if the document carries every link in `links`.
    pub fn matches_all<'a>(&self, links: impl IntoIterator<Item = &'a AssetLink>) -> bool {
        links.into_iter().all(|link| self.asset_links.contains(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_asset_id_json_omits_empty_metadata() {
        let id = SpecificAssetId::new("serialNumber", "1234");
        let json = serde_json::to_value(&id).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "name": "serialNumber", "value": "1234" })
        );
    }

    #[test]
    fn specific_asset_id_keeps_reference_metadata() {
        let raw = r#"{
            "name": "partId",
            "value": "P-1",
            "externalSubjectId": {
                "type": "ExternalReference",
                "keys": [{ "type": "GlobalReference", "value": "urn:vendor:acme" }]
            }
        }"#;

        let id: SpecificAssetId = serde_json::from_str(raw).unwrap();
        let subject = id.external_subject_id.as_ref().unwrap();

        assert_eq!(subject.kind, ReferenceTypes::ExternalReference);
        assert_eq!(subject.keys[0].value, "urn:vendor:acme");
        assert_eq!(id.to_link(), AssetLink::new("partId", "P-1"));
    }

    #[test]
    fn links_compare_case_sensitively() {
        assert_ne!(AssetLink::new("Serial", "a"), AssetLink::new("serial", "a"));
        assert_ne!(AssetLink::new("serial", "A"), AssetLink::new("serial", "a"));
    }
}
