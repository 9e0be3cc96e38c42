use crate::error::*;
use crate::model::{AssetLink, DiscoveryDocument};
use crate::pagination::{CursorPage, CursorPaginator, PaginationInfo};

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

/// A trait for injecting persistence of discovery documents into the service.
///
/// Implementations store whole documents keyed by shell id. A single `save` or `delete_by_id`
/// must be atomic; everything above one document is coordinated by the service.
pub trait StorageBackend: Send + Sync + 'static + Clone {
    /// Stores a document, replacing any previous document with the same shell id.
    fn save(
        &self,
        document: DiscoveryDocument,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Reads the document of a shell.
    fn find_by_id(
        &self,
        shell_id: &str,
    ) -> impl Future<Output = Result<Option<DiscoveryDocument>, StorageError>> + Send;

    /// Checks if a document exists for a shell.
    fn exists_by_id(&self, shell_id: &str)
    -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Returns every document carrying at least one of `links`, in no particular order.
    fn find_all_matching_any(
        &self,
        links: &BTreeSet<AssetLink>,
    ) -> impl Future<Output = Result<Vec<DiscoveryDocument>, StorageError>> + Send;

    /// Returns every stored document.
    fn find_all(&self) -> impl Future<Output = Result<Vec<DiscoveryDocument>, StorageError>> + Send;

    /// Removes the document of a shell. Removing an absent document is not an error.
    fn delete_by_id(&self, shell_id: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Returns documents with a shell id strictly greater than `cursor`, ascending.
    ///
    /// The default loads everything and pages in memory; backends with an ordered index should
    /// seek instead.
    fn find_after(
        &self,
        cursor: Option<&str>,
        limit: Option<NonZeroUsize>,
    ) -> impl Future<Output = Result<CursorPage<DiscoveryDocument>, StorageError>> + Send {
        let info = PaginationInfo::new(limit, cursor.map(str::to_owned));
        async move {
            let mut documents = self.find_all().await?;
            documents.sort_by(|a, b| a.shell_id.cmp(&b.shell_id));
            Ok(CursorPaginator::paginate(documents, &info))
        }
    }
}
