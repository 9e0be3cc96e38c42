use crate::model::{DiscoveryDocument, SpecificAssetId};

use serde::{Deserialize, Serialize};
use tracing::info;

/// A state transition of the discovery index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscoveryEvent {
    Linked {
        shell_id: String,
        identifiers: Vec<SpecificAssetId>,
    },
    Unlinked {
        shell_id: String,
    },
}

impl DiscoveryEvent {
    pub fn shell_id(&self) -> &str {
        match self {
            Self::Linked { shell_id, .. } | Self::Unlinked { shell_id } => shell_id,
        }
    }
}

/// A trait for reacting to successful transitions (event publishing, auditing, ...).
///
/// Called after the document was stored or removed, never on failure. Observers cannot fail the
/// operation that triggered them; they are expected to handle their own errors.
pub trait DiscoveryObserver: Send + Sync + 'static + Clone {
    fn on_linked(&self, _document: &DiscoveryDocument) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn on_unlinked(&self, _shell_id: &str) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Placeholder when nothing observes the index.
#[derive(Clone, Debug, Default)]
pub struct NoObserver;

impl DiscoveryObserver for NoObserver {}

/// Emits one log line per transition.
#[derive(Clone, Debug, Default)]
pub struct TracingObserver;

impl DiscoveryObserver for TracingObserver {
    async fn on_linked(&self, document: &DiscoveryDocument) {
        info!(
            shell_id = %document.shell_id,
            links = document.asset_links.len(),
            "asset links created"
        );
    }

    async fn on_unlinked(&self, shell_id: &str) {
        info!(%shell_id, "asset links deleted");
    }
}

/// Notifies both observers, left first.
impl<A, B> DiscoveryObserver for (A, B)
where
    A: DiscoveryObserver,
    B: DiscoveryObserver,
{
    async fn on_linked(&self, document: &DiscoveryDocument) {
        self.0.on_linked(document).await;
        self.1.on_linked(document).await;
    }

    async fn on_unlinked(&self, shell_id: &str) {
        self.0.on_unlinked(shell_id).await;
        self.1.on_unlinked(shell_id).await;
    }
}
