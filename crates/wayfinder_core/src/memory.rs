use crate::error::StorageError;
use crate::model::{AssetLink, DiscoveryDocument};
use crate::pagination::{CursorPage, CursorPaginator, PaginationInfo};
use crate::storage::StorageBackend;

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    documents: BTreeMap<String, DiscoveryDocument>,
    /// Inverted index: link -> shells carrying it.
    links: BTreeMap<AssetLink, BTreeSet<String>>,
}

impl Inner {
    fn unindex(&mut self, document: &DiscoveryDocument) {
        for link in &document.asset_links {
            if let Some(shells) = self.links.get_mut(link) {
                shells.remove(&document.shell_id);
                if shells.is_empty() {
                    self.links.remove(link);
                }
            }
        }
    }
}

/// Process-local storage backed by an ordered map.
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for InMemoryStorage {
    async fn save(&self, document: DiscoveryDocument) -> Result<(), StorageError> {
        let mut inner = self.inner.write();
        if let Some(previous) = inner.documents.remove(&document.shell_id) {
            inner.unindex(&previous);
        }
        for link in &document.asset_links {
            inner
                .links
                .entry(link.clone())
                .or_default()
                .insert(document.shell_id.clone());
        }
        inner.documents.insert(document.shell_id.clone(), document);
        Ok(())
    }

    async fn find_by_id(&self, shell_id: &str) -> Result<Option<DiscoveryDocument>, StorageError> {
        Ok(self.inner.read().documents.get(shell_id).cloned())
    }

    async fn exists_by_id(&self, shell_id: &str) -> Result<bool, StorageError> {
        Ok(self.inner.read().documents.contains_key(shell_id))
    }

    async fn find_all_matching_any(
        &self,
        links: &BTreeSet<AssetLink>,
    ) -> Result<Vec<DiscoveryDocument>, StorageError> {
        let inner = self.inner.read();
        let shells: BTreeSet<&String> = links
            .iter()
            .filter_map(|link| inner.links.get(link))
            .flatten()
            .collect();

        Ok(shells
            .into_iter()
            .filter_map(|shell_id| inner.documents.get(shell_id).cloned())
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<DiscoveryDocument>, StorageError> {
        Ok(self.inner.read().documents.values().cloned().collect())
    }

    async fn delete_by_id(&self, shell_id: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write();
        if let Some(previous) = inner.documents.remove(shell_id) {
            inner.unindex(&previous);
        }
        Ok(())
    }

    async fn find_after(
        &self,
        cursor: Option<&str>,
        limit: Option<NonZeroUsize>,
    ) -> Result<CursorPage<DiscoveryDocument>, StorageError> {
        let info = PaginationInfo::new(limit, cursor.map(str::to_owned));
        Ok(CursorPaginator::paginate_map(
            &self.inner.read().documents,
            &info,
        ))
    }
}
