//! Keeps discovery in step with a shell repository or registry.
//!
//! The repository calls the linker after its own state changed. Replacing links is always
//! delete-then-create, so a concurrent lookup may briefly find the shell unlinked.

use crate::derive::derive_asset_links;
use crate::error::DiscoveryError;
use crate::model::AssetInformation;
use crate::observer::DiscoveryObserver;
use crate::service::DiscoveryService;
use crate::storage::StorageBackend;

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    /// Nothing to index, or nothing changed.
    Skipped,
}

#[derive(Clone)]
pub struct ShellLinker<S, O> {
    discovery: DiscoveryService<S, O>,
}

impl<S, O> ShellLinker<S, O>
where
    S: StorageBackend,
    O: DiscoveryObserver,
{
    pub fn new(discovery: DiscoveryService<S, O>) -> Self {
        Self { discovery }
    }

    /// Registers a newly created shell. Shells without any asset identifier are not indexed.
    ///
    /// The global asset id is stored alongside the specific ones, so a shell known only by its
    /// global asset id can be read back as well as found.
    pub async fn link(
        &self,
        shell_id: &str,
        asset: &AssetInformation,
    ) -> Result<LinkOutcome, DiscoveryError> {
        let global = asset.global_asset_id.as_deref();
        if derive_asset_links(&asset.specific_asset_ids, global)?.is_empty() {
            debug!(%shell_id, "shell has no asset identifiers, not linking");
            return Ok(LinkOutcome::Skipped);
        }

        self.discovery
            .register(shell_id, asset.specific_asset_ids.clone(), global)
            .await?;
        Ok(LinkOutcome::Linked)
    }

    /// Replaces the links of a shell whose asset information changed.
    pub async fn relink(
        &self,
        shell_id: &str,
        previous: &AssetInformation,
        current: &AssetInformation,
    ) -> Result<LinkOutcome, DiscoveryError> {
        if previous.global_asset_id == current.global_asset_id
            && previous.specific_asset_ids == current.specific_asset_ids
        {
            info!(%shell_id, "no changes in asset links, skipping discovery update");
            return Ok(LinkOutcome::Skipped);
        }

        self.unlink(shell_id).await?;
        self.link(shell_id, current).await
    }

    /// Removes the links of a deleted shell. A shell that was never linked is fine.
    pub async fn unlink(&self, shell_id: &str) -> Result<(), DiscoveryError> {
        match self.discovery.delete_all(shell_id).await {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetLink, SpecificAssetId};
    use crate::pagination::PaginationInfo;
    use crate::memory::InMemoryStorage;
    use crate::observer::NoObserver;

    fn asset(global: Option<&str>, pairs: &[(&str, &str)]) -> AssetInformation {
        AssetInformation {
            global_asset_id: global.map(str::to_owned),
            specific_asset_ids: pairs
                .iter()
                .map(|(name, value)| SpecificAssetId::new(*name, *value))
                .collect(),
        }
    }

    async fn shells_for(
        linker: &ShellLinker<InMemoryStorage, NoObserver>,
        link: AssetLink,
    ) -> Vec<String> {
        linker
            .discovery
            .query_by_links([link], &PaginationInfo::NO_LIMIT)
            .await
            .unwrap()
            .items
    }

    fn linker() -> ShellLinker<InMemoryStorage, NoObserver> {
        ShellLinker::new(DiscoveryService::new(InMemoryStorage::new()))
    }

    #[tokio::test]
    async fn links_specific_and_global_ids() {
        let linker = linker();

        let outcome = linker
            .link("aas-1", &asset(Some("urn:g"), &[("serial", "1")]))
            .await
            .unwrap();

        assert_eq!(outcome, LinkOutcome::Linked);
        assert_eq!(
            shells_for(&linker, AssetLink::new("globalAssetId", "urn:g")).await,
            vec!["aas-1"]
        );
        assert_eq!(
            shells_for(&linker, AssetLink::new("serial", "1")).await,
            vec!["aas-1"]
        );
    }

    #[tokio::test]
    async fn global_only_shell_reads_back_its_global_asset_id() {
        let linker = linker();

        linker
            .link("aas-1", &asset(Some("urn:asset:42"), &[]))
            .await
            .unwrap();

        assert_eq!(
            shells_for(&linker, AssetLink::new("globalAssetId", "urn:asset:42")).await,
            vec!["aas-1"]
        );
        assert_eq!(
            linker.discovery.get_identifiers("aas-1").await.unwrap(),
            vec![SpecificAssetId::new("globalAssetId", "urn:asset:42")]
        );
    }

    #[tokio::test]
    async fn skips_shells_without_identifiers() {
        let linker = linker();

        let outcome = linker.link("aas-1", &asset(None, &[])).await.unwrap();

        assert_eq!(outcome, LinkOutcome::Skipped);
        assert!(!linker.discovery.storage().exists_by_id("aas-1").await.unwrap());
    }

    #[tokio::test]
    async fn relink_replaces_links() {
        let linker = linker();
        let before = asset(Some("urn:old"), &[]);
        let after = asset(Some("urn:new"), &[]);
        linker.link("aas-1", &before).await.unwrap();

        let outcome = linker.relink("aas-1", &before, &after).await.unwrap();

        assert_eq!(outcome, LinkOutcome::Linked);
        assert!(
            shells_for(&linker, AssetLink::new("globalAssetId", "urn:old"))
                .await
                .is_empty()
        );
        assert_eq!(
            shells_for(&linker, AssetLink::new("globalAssetId", "urn:new")).await,
            vec!["aas-1"]
        );
    }

    #[tokio::test]
    async fn relink_without_changes_is_skipped() {
        let linker = linker();
        let info = asset(Some("urn:g"), &[("serial", "1")]);
        linker.link("aas-1", &info).await.unwrap();

        let outcome = linker.relink("aas-1", &info, &info.clone()).await.unwrap();

        assert_eq!(outcome, LinkOutcome::Skipped);
    }

    #[tokio::test]
    async fn relink_of_unlinked_shell_links_it() {
        let linker = linker();

        let outcome = linker
            .relink("aas-1", &asset(None, &[]), &asset(Some("urn:g"), &[]))
            .await
            .unwrap();

        assert_eq!(outcome, LinkOutcome::Linked);
    }

    #[tokio::test]
    async fn unlink_tolerates_missing_links() {
        linker().unlink("never-linked").await.unwrap();
    }
}
