use tokio::sync::broadcast;
use tracing::trace;
use wayfinder_core::prelude::*;

/// Fans discovery events out to every live subscriber (the `/lookup/events` websocket).
///
/// Subscribers that fall behind by more than the channel capacity lose the oldest events.
#[derive(Clone, Debug)]
pub struct BroadcastObserver {
    sender: broadcast::Sender<DiscoveryEvent>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: DiscoveryEvent) {
        // Only fails when nobody listens.
        if self.sender.send(event).is_err() {
            trace!("no event subscribers");
        }
    }
}

impl Default for BroadcastObserver {
    fn default() -> Self {
        Self::new(256)
    }
}

impl DiscoveryObserver for BroadcastObserver {
    async fn on_linked(&self, document: &DiscoveryDocument) {
        self.publish(DiscoveryEvent::Linked {
            shell_id: document.shell_id.clone(),
            identifiers: document.identifiers.clone(),
        });
    }

    async fn on_unlinked(&self, shell_id: &str) {
        self.publish(DiscoveryEvent::Unlinked {
            shell_id: shell_id.to_owned(),
        });
    }
}
