use crate::config::{DiscoveryConfig, MatchMode};
use crate::constants::links::GLOBAL_ASSET_ID;
use crate::derive::derive_asset_links;
use crate::error::DiscoveryError;
use crate::guard::KeyedAccessGuard;
use crate::model::{AssetLink, DiscoveryDocument, SpecificAssetId};
use crate::observer::{DiscoveryObserver, NoObserver};
use crate::pagination::{CursorPage, CursorPaginator, PaginationInfo};
use crate::storage::StorageBackend;

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// The discovery index: maps shells to the asset links they can be found by.
///
/// Mutations of one shell are serialized through a [`KeyedAccessGuard`], reads of that shell
/// wait for them. Different shells never contend. Cloning is cheap and clones share the guard.
#[derive(Clone)]
pub struct DiscoveryService<S, O = NoObserver> {
    storage: S,
    observer: O,
    guard: Arc<KeyedAccessGuard>,
    config: Arc<DiscoveryConfig>,
}

impl<S: StorageBackend> DiscoveryService<S> {
    pub fn new(storage: S) -> Self {
        Self::with_observer(storage, NoObserver, DiscoveryConfig::default())
    }
}

impl<S, O> DiscoveryService<S, O>
where
    S: StorageBackend,
    O: DiscoveryObserver,
{
    pub fn with_observer(storage: S, observer: O, config: DiscoveryConfig) -> Self {
        Self {
            storage,
            observer,
            guard: Arc::new(KeyedAccessGuard::new()),
            config: Arc::new(config),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Links `identifiers` to a shell that has no asset links yet.
    ///
    /// Returns the identifiers unchanged.
    pub async fn create(
        &self,
        shell_id: &str,
        identifiers: Vec<SpecificAssetId>,
    ) -> Result<Vec<SpecificAssetId>, DiscoveryError> {
        self.register(shell_id, identifiers, None).await
    }

    /// Like [`create`](Self::create), additionally linking the shell by its global asset id.
    ///
    /// The global asset id is appended to the stored identifiers as a `globalAssetId` entry
    /// unless an identical entry is already present, so everything a shell is found by can be
    /// read back. Returns the stored identifiers.
    pub async fn register(
        &self,
        shell_id: &str,
        mut identifiers: Vec<SpecificAssetId>,
        global_asset_id: Option<&str>,
    ) -> Result<Vec<SpecificAssetId>, DiscoveryError> {
        if let Some(global) = global_asset_id {
            let entry = SpecificAssetId::new(GLOBAL_ASSET_ID, global);
            if !identifiers.contains(&entry) {
                identifiers.push(entry);
            }
        }

        self.guard
            .write(shell_id, move || async move {
                if self.storage.exists_by_id(shell_id).await? {
                    return Err(DiscoveryError::Collision(shell_id.to_owned()));
                }

                let asset_links = derive_asset_links(&identifiers, None)?;
                let document = DiscoveryDocument {
                    shell_id: shell_id.to_owned(),
                    asset_links,
                    identifiers,
                };

                self.storage.save(document.clone()).await?;
                debug!(%shell_id, links = document.asset_links.len(), "asset links stored");

                self.observer.on_linked(&document).await;
                Ok(document.identifiers)
            })
            .await
    }

    /// Returns the identifiers a shell was linked with, in their original order.
    ///
    /// A shell linked with an empty identifier list has nothing discoverable and is reported as
    /// [`DiscoveryError::NotFound`].
    pub async fn get_identifiers(
        &self,
        shell_id: &str,
    ) -> Result<Vec<SpecificAssetId>, DiscoveryError> {
        self.guard
            .read(shell_id, move || async move {
                match self.storage.find_by_id(shell_id).await? {
                    Some(document) if !document.identifiers.is_empty() => Ok(document.identifiers),
                    _ => Err(DiscoveryError::NotFound(shell_id.to_owned())),
                }
            })
            .await
    }

    /// Removes every asset link of a shell.
    pub async fn delete_all(&self, shell_id: &str) -> Result<(), DiscoveryError> {
        self.guard
            .write(shell_id, move || async move {
                if !self.storage.exists_by_id(shell_id).await? {
                    return Err(DiscoveryError::NotFound(shell_id.to_owned()));
                }

                self.storage.delete_by_id(shell_id).await?;
                debug!(%shell_id, "asset links removed");

                self.observer.on_unlinked(shell_id).await;
                Ok(())
            })
            .await
    }

    /// Returns the ids of shells carrying the requested links, sorted and paginated.
    ///
    /// Which documents qualify depends on the configured [`MatchMode`]. An empty request matches
    /// nothing.
    pub async fn query_by_links(
        &self,
        links: impl IntoIterator<Item = AssetLink>,
        pagination: &PaginationInfo,
    ) -> Result<CursorPage<String>, DiscoveryError> {
        let requested: BTreeSet<AssetLink> = links.into_iter().collect();
        if requested.is_empty() {
            return Ok(CursorPage::empty());
        }

        let candidates = self.storage.find_all_matching_any(&requested).await?;
        let mode = self.config.match_mode;
        let shell_ids: BTreeSet<String> = candidates
            .into_iter()
            .filter(|document| match mode {
                MatchMode::Any => document.matches_any(&requested),
                MatchMode::All => document.matches_all(&requested),
            })
            .map(|document| document.shell_id)
            .collect();

        debug!(
            requested = requested.len(),
            matched = shell_ids.len(),
            %mode,
            "asset link query"
        );

        Ok(CursorPaginator::paginate_keys(&shell_ids, pagination))
    }

    /// Pages through every stored document in shell id order.
    pub async fn list_documents(
        &self,
        pagination: &PaginationInfo,
    ) -> Result<CursorPage<DiscoveryDocument>, DiscoveryError> {
        let page = self
            .storage
            .find_after(pagination.cursor(), pagination.limit)
            .await?;
        Ok(page)
    }
}
