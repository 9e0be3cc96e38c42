//! Behaviour every [`StorageBackend`] has to share.
//!
//! Backend crates enable the `testing` feature as a dev-dependency and instantiate the suite:
//!
//! ```ignore
//! wayfinder_core::storage_conformance_suite!((MyStorage::new(), ()));
//! ```
//!
//! The setup expression is evaluated once per test and yields the backend plus anything that has
//! to stay alive while it runs (a temporary directory, for instance).

use crate::error::DiscoveryError;
use crate::model::{AssetLink, DiscoveryDocument, SpecificAssetId};
use crate::pagination::PaginationInfo;
use crate::service::DiscoveryService;
use crate::storage::StorageBackend;

use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;

fn ids(pairs: &[(&str, &str)]) -> Vec<SpecificAssetId> {
    pairs
        .iter()
        .map(|(name, value)| SpecificAssetId::new(*name, *value))
        .collect()
}

fn document(shell_id: &str, pairs: &[(&str, &str)]) -> DiscoveryDocument {
    DiscoveryDocument {
        shell_id: shell_id.to_owned(),
        asset_links: pairs.iter().map(|(n, v)| AssetLink::new(*n, *v)).collect(),
        identifiers: ids(pairs),
    }
}

/// Seeds `count` shells (`shell-000`, `shell-001`, ...) that all carry `link`.
async fn seed_shared<S: StorageBackend>(
    service: &DiscoveryService<S>,
    count: usize,
    link: &AssetLink,
) -> Vec<String> {
    let shell_ids: Vec<String> = (0..count).map(|i| format!("shell-{i:03}")).collect();
    try_join_all(shell_ids.iter().map(|shell_id| {
        service.create(
            shell_id,
            vec![SpecificAssetId::new(link.name.as_str(), link.value.as_str())],
        )
    }))
    .await
    .expect("seeding failed");
    shell_ids
}

async fn collect_query<S: StorageBackend>(
    service: &DiscoveryService<S>,
    link: &AssetLink,
    limit: usize,
) -> Vec<String> {
    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let page = service
            .query_by_links([link.clone()], &PaginationInfo::limited(limit).after(cursor))
            .await
            .expect("query failed");
        assert!(page.items.len() <= limit, "page exceeds limit {limit}");
        seen.extend(page.items);
        match page.cursor {
            Some(next) => cursor = Some(next),
            None => return seen,
        }
    }
}

pub async fn round_trip<S: StorageBackend>(storage: S) {
    let service = DiscoveryService::new(storage);
    let identifiers = ids(&[("serial", "42"), ("batch", "7"), ("serial", "42")]);

    let created = service.create("aas-1", identifiers.clone()).await.unwrap();

    assert_eq!(created, identifiers);
    assert_eq!(service.get_identifiers("aas-1").await.unwrap(), identifiers);
}

pub async fn collision_keeps_first<S: StorageBackend>(storage: S) {
    let service = DiscoveryService::new(storage);
    service.create("aas-1", ids(&[("a", "1")])).await.unwrap();

    let second = service.create("aas-1", ids(&[("b", "2")])).await;

    assert!(matches!(second, Err(DiscoveryError::Collision(id)) if id == "aas-1"));
    assert_eq!(
        service.get_identifiers("aas-1").await.unwrap(),
        ids(&[("a", "1")])
    );
    let page = service
        .query_by_links([AssetLink::new("b", "2")], &PaginationInfo::NO_LIMIT)
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

pub async fn delete_leaves_tombstone<S: StorageBackend>(storage: S) {
    let service = DiscoveryService::new(storage);
    service.create("aas-1", ids(&[("a", "1")])).await.unwrap();

    service.delete_all("aas-1").await.unwrap();

    assert!(service.get_identifiers("aas-1").await.unwrap_err().is_not_found());
    assert!(service.delete_all("aas-1").await.unwrap_err().is_not_found());
    let page = service
        .query_by_links([AssetLink::new("a", "1")], &PaginationInfo::NO_LIMIT)
        .await
        .unwrap();
    assert!(page.items.is_empty());
    // The shell can be linked again afterwards.
    service.create("aas-1", ids(&[("b", "2")])).await.unwrap();
}

pub async fn query_returns_exactly_matching_shells<S: StorageBackend>(storage: S) {
    let service = DiscoveryService::new(storage);
    let global = AssetLink::new("globalAssetId", "urn:asset:G");
    service
        .create("aas-b", ids(&[("globalAssetId", "urn:asset:G"), ("x", "1")]))
        .await
        .unwrap();
    service
        .register("aas-a", ids(&[("x", "2")]), Some("urn:asset:G"))
        .await
        .unwrap();
    service
        .create("aas-c", ids(&[("globalAssetId", "urn:asset:other")]))
        .await
        .unwrap();
    // Same value under another name is a different link.
    service
        .create("aas-d", ids(&[("serial", "urn:asset:G")]))
        .await
        .unwrap();

    let page = service
        .query_by_links([global], &PaginationInfo::NO_LIMIT)
        .await
        .unwrap();

    assert_eq!(page.items, vec!["aas-a", "aas-b"]);
    assert_eq!(page.cursor, None);
}

pub async fn pagination_is_complete<S: StorageBackend>(storage: S) {
    let service = DiscoveryService::new(storage);
    let link = AssetLink::new("fleet", "north");
    let expected = seed_shared(&service, 7, &link).await;

    for limit in 1..=expected.len() {
        assert_eq!(
            collect_query(&service, &link, limit).await,
            expected,
            "page size {limit}"
        );
    }
}

pub async fn pagination_resumes_after_deleted_cursor<S: StorageBackend>(storage: S) {
    let service = DiscoveryService::new(storage);
    let link = AssetLink::new("fleet", "south");
    seed_shared(&service, 5, &link).await;

    let first = service
        .query_by_links([link.clone()], &PaginationInfo::limited(2))
        .await
        .unwrap();
    assert_eq!(first.items, vec!["shell-000", "shell-001"]);
    let cursor = first.cursor.clone().expect("more pages");

    service.delete_all(&cursor).await.unwrap();
    service.delete_all("shell-002").await.unwrap();

    let rest = service
        .query_by_links([link], &PaginationInfo::limited(2).after(Some(cursor)))
        .await
        .unwrap();
    assert_eq!(rest.items, vec!["shell-003", "shell-004"]);
    assert!(rest.is_last());
}

pub async fn global_asset_scenario<S: StorageBackend>(storage: S) {
    let service = DiscoveryService::new(storage);

    service
        .create("aas-1", ids(&[("globalAssetId", "urn:asset:42")]))
        .await
        .unwrap();
    let page = service
        .query_by_links(
            [AssetLink::new("globalAssetId", "urn:asset:42")],
            &PaginationInfo::NO_LIMIT,
        )
        .await
        .unwrap();
    assert_eq!(page.items, vec!["aas-1"]);
    assert_eq!(page.cursor, None);

    service.delete_all("aas-1").await.unwrap();
    assert!(service.get_identifiers("aas-1").await.unwrap_err().is_not_found());
}

pub async fn save_replaces_previous_document<S: StorageBackend>(storage: S) {
    storage.save(document("aas-1", &[("a", "1")])).await.unwrap();
    storage.save(document("aas-1", &[("b", "2")])).await.unwrap();

    let old = BTreeSet::from([AssetLink::new("a", "1")]);
    let new = BTreeSet::from([AssetLink::new("b", "2")]);
    assert!(storage.find_all_matching_any(&old).await.unwrap().is_empty());
    assert_eq!(storage.find_all_matching_any(&new).await.unwrap().len(), 1);
    assert_eq!(storage.find_all().await.unwrap().len(), 1);
}

pub async fn delete_of_absent_document_is_ok<S: StorageBackend>(storage: S) {
    storage.delete_by_id("never-stored").await.unwrap();

    assert!(!storage.exists_by_id("never-stored").await.unwrap());
    assert!(storage.find_by_id("never-stored").await.unwrap().is_none());
}

pub async fn find_all_matching_any_returns_each_document_once<S: StorageBackend>(storage: S) {
    storage
        .save(document("aas-1", &[("a", "1"), ("b", "2")]))
        .await
        .unwrap();
    storage.save(document("aas-2", &[("c", "3")])).await.unwrap();

    let links = BTreeSet::from([AssetLink::new("a", "1"), AssetLink::new("b", "2")]);
    let found = storage.find_all_matching_any(&links).await.unwrap();

    assert_eq!(found, vec![document("aas-1", &[("a", "1"), ("b", "2")])]);
}

pub async fn find_after_walks_documents_in_order<S: StorageBackend>(storage: S) {
    for shell_id in ["c", "a", "d", "b"] {
        storage.save(document(shell_id, &[("k", shell_id)])).await.unwrap();
    }
    let two = NonZeroUsize::new(2);

    let first = storage.find_after(None, two).await.unwrap();
    let second = storage
        .find_after(first.cursor.as_deref(), two)
        .await
        .unwrap();

    let shells = |page: &[DiscoveryDocument]| -> Vec<String> {
        page.iter().map(|d| d.shell_id.clone()).collect()
    };
    assert_eq!(shells(&first.items), vec!["a", "b"]);
    assert_eq!(first.cursor.as_deref(), Some("b"));
    assert_eq!(shells(&second.items), vec!["c", "d"]);
    assert!(second.is_last());
    // A cursor between keys resumes at the next greater key.
    let between = storage.find_after(Some("bb"), None).await.unwrap();
    assert_eq!(shells(&between.items), vec!["c", "d"]);
}

pub async fn long_url_shell_ids_round_trip<S: StorageBackend>(storage: S) {
    let service = DiscoveryService::new(storage);
    let long = format!("https://example.com/ids/aas/{}", "7".repeat(2000 - 28));
    assert_eq!(long.len(), 2000);
    let identifiers = ids(&[("serial", "SN-2000")]);

    service.create(&long, identifiers.clone()).await.unwrap();
    service.create("aas-short", identifiers.clone()).await.unwrap();

    assert_eq!(service.get_identifiers(&long).await.unwrap(), identifiers);
    let first = service
        .query_by_links([AssetLink::new("serial", "SN-2000")], &PaginationInfo::limited(1))
        .await
        .unwrap();
    assert_eq!(first.items, vec!["aas-short"]);
    let second = service
        .query_by_links(
            [AssetLink::new("serial", "SN-2000")],
            &PaginationInfo::limited(1).after(first.cursor),
        )
        .await
        .unwrap();
    assert_eq!(second.items, vec![long.clone()]);
    assert!(second.is_last());

    let documents = service
        .list_documents(&PaginationInfo::limited(1).after(Some("aas-short".into())))
        .await
        .unwrap();
    assert_eq!(documents.items.len(), 1);
    assert_eq!(documents.items[0].shell_id, long);

    service.delete_all(&long).await.unwrap();
    assert!(service.get_identifiers(&long).await.unwrap_err().is_not_found());
}

/// Expands to one `#[tokio::test]` per conformance check.
///
/// `$setup` must evaluate to `(storage, keep_alive)`.
#[macro_export]
macro_rules! storage_conformance_suite {
    ($setup:expr) => {
        mod storage_conformance {
            #[allow(unused_imports)]
            use super::*;

            $crate::storage_conformance_suite!(@cases $setup;
                round_trip,
                collision_keeps_first,
                delete_leaves_tombstone,
                query_returns_exactly_matching_shells,
                pagination_is_complete,
                pagination_resumes_after_deleted_cursor,
                global_asset_scenario,
                save_replaces_previous_document,
                delete_of_absent_document_is_ok,
                find_all_matching_any_returns_each_document_once,
                find_after_walks_documents_in_order,
                long_url_shell_ids_round_trip
            );
        }
    };
    (@cases $setup:expr; $($case:ident),* $(,)?) => {
        $(
            #[tokio::test]
            async fn $case() {
                let (storage, _keep_alive) = $setup;
                $crate::testing::$case(storage).await;
            }
        )*
    };
}

