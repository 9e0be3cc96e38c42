//! Wire encodings of the lookup API.
//!
//! Shell ids travel base64url-encoded in paths and cursors; asset links travel as
//! base64url-encoded JSON objects in the `assetIds` query parameter.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use thiserror::Error;
use url::form_urlencoded;
use wayfinder_core::prelude::*;

/// Base64url, emitted without padding and accepted with or without it.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A request that cannot be understood.
/// Maps to **HTTP 400 Bad Request**.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("'{0}' is not valid UTF-8 base64url")]
    InvalidEncoding(String),

    #[error("'{0}' does not encode an asset link")]
    InvalidAssetLink(String),

    #[error("limit must be a positive integer, got '{0}'")]
    InvalidLimit(String),
}

pub fn encode_id(id: &str) -> String {
    URL_SAFE_LENIENT.encode(id)
}

pub fn decode_id(encoded: &str) -> Result<String, RequestError> {
    URL_SAFE_LENIENT
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| RequestError::InvalidEncoding(encoded.to_owned()))
}

pub fn encode_asset_link(link: &AssetLink) -> Result<String, serde_json::Error> {
    Ok(URL_SAFE_LENIENT.encode(serde_json::to_vec(link)?))
}

/// Accepts a plain `{name, value}` object as well as a full specific asset id.
pub fn decode_asset_link(encoded: &str) -> Result<AssetLink, RequestError> {
    let json = URL_SAFE_LENIENT
        .decode(encoded)
        .map_err(|_| RequestError::InvalidEncoding(encoded.to_owned()))?;
    serde_json::from_slice(&json).map_err(|_| RequestError::InvalidAssetLink(encoded.to_owned()))
}

/// The `limit` and `cursor` query parameters.
fn paging(
    limit: Option<&str>,
    cursor: Option<&str>,
    default_limit: NonZeroUsize,
) -> Result<PaginationInfo, RequestError> {
    let limit = match limit {
        None => default_limit,
        Some(raw) => raw
            .parse::<NonZeroUsize>()
            .map_err(|_| RequestError::InvalidLimit(raw.to_owned()))?,
    };
    let cursor = cursor
        .filter(|cursor| !cursor.is_empty())
        .map(decode_id)
        .transpose()?;

    Ok(PaginationInfo::new(Some(limit), cursor))
}

/// Query of `GET /lookup/shells`.
///
/// `assetIds` may be repeated and each occurrence may hold a comma separated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub asset_links: Vec<AssetLink>,
    pub pagination: PaginationInfo,
}

impl LookupQuery {
    pub fn parse(raw: Option<&str>, default_limit: NonZeroUsize) -> Result<Self, RequestError> {
        let mut asset_links = Vec::new();
        let mut limit = None;
        let mut cursor = None;

        for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "assetIds" => {
                    for encoded in value.split(',').filter(|part| !part.is_empty()) {
                        asset_links.push(decode_asset_link(encoded)?);
                    }
                }
                "limit" => limit = Some(value.into_owned()),
                "cursor" => cursor = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(Self {
            asset_links,
            pagination: paging(limit.as_deref(), cursor.as_deref(), default_limit)?,
        })
    }
}

/// Query of `GET /lookup/documents`.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl PageQuery {
    pub fn pagination(&self, default_limit: NonZeroUsize) -> Result<PaginationInfo, RequestError> {
        paging(self.limit.as_deref(), self.cursor.as_deref(), default_limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// A page on the wire: `{ "paging_metadata": { "cursor": … }, "result": [ … ] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub paging_metadata: PagingMetadata,
    pub result: Vec<T>,
}

impl<T> From<CursorPage<T>> for PagedResult<T> {
    fn from(page: CursorPage<T>) -> Self {
        Self {
            paging_metadata: PagingMetadata {
                cursor: page.cursor.as_deref().map(encode_id),
            },
            result: page.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUNDRED: NonZeroUsize = NonZeroUsize::new(100).unwrap();

    #[test]
    fn ids_decode_with_and_without_padding() {
        // "aas-1" encodes to "YWFzLTE=" with padding.
        assert_eq!(decode_id("YWFzLTE").unwrap(), "aas-1");
        assert_eq!(decode_id("YWFzLTE=").unwrap(), "aas-1");
        assert_eq!(encode_id("aas-1"), "YWFzLTE");
    }

    #[test]
    fn url_ids_use_the_url_safe_alphabet() {
        let id = "https://example.com/ids/aas/1?x=>";
        let encoded = encode_id(id);

        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(decode_id(&encoded).unwrap(), id);
    }

    #[test]
    fn rejects_garbage_ids() {
        assert!(matches!(
            decode_id("not base64!"),
            Err(RequestError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn asset_links_accept_full_specific_asset_ids() {
        let json = r#"{"name":"serial","value":"42","externalSubjectId":{"type":"ExternalReference","keys":[]}}"#;
        let encoded = URL_SAFE_LENIENT.encode(json);

        assert_eq!(
            decode_asset_link(&encoded).unwrap(),
            AssetLink::new("serial", "42")
        );
    }

    #[test]
    fn lookup_query_collects_repeated_and_comma_separated_ids() {
        let a = encode_asset_link(&AssetLink::new("a", "1")).unwrap();
        let b = encode_asset_link(&AssetLink::new("b", "2")).unwrap();
        let c = encode_asset_link(&AssetLink::new("c", "3")).unwrap();
        let raw = format!("assetIds={a},{b}&assetIds={c}&limit=5");

        let query = LookupQuery::parse(Some(&raw), HUNDRED).unwrap();

        assert_eq!(
            query.asset_links,
            vec![
                AssetLink::new("a", "1"),
                AssetLink::new("b", "2"),
                AssetLink::new("c", "3")
            ]
        );
        assert_eq!(query.pagination, PaginationInfo::limited(5));
    }

    #[test]
    fn lookup_query_defaults() {
        let query = LookupQuery::parse(None, HUNDRED).unwrap();

        assert!(query.asset_links.is_empty());
        assert_eq!(query.pagination, PaginationInfo::limited(100));
    }

    #[test]
    fn limit_must_be_positive() {
        for raw in ["limit=0", "limit=-1", "limit=ten"] {
            assert!(matches!(
                LookupQuery::parse(Some(raw), HUNDRED),
                Err(RequestError::InvalidLimit(_))
            ));
        }
    }

    #[test]
    fn cursor_is_decoded() {
        let raw = format!("cursor={}", encode_id("aas-7"));

        let query = LookupQuery::parse(Some(&raw), HUNDRED).unwrap();

        assert_eq!(query.pagination.cursor(), Some("aas-7"));
    }

    #[test]
    fn paged_result_encodes_the_cursor() {
        let page = CursorPage {
            items: vec!["aas-1".to_string()],
            cursor: Some("aas-1".to_string()),
        };

        let json = serde_json::to_value(PagedResult::from(page)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "paging_metadata": { "cursor": "YWFzLTE" },
                "result": ["aas-1"]
            })
        );
    }
}
