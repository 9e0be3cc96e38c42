use crate::ServerConfig;
use crate::events::BroadcastObserver;

use std::sync::Arc;
use wayfinder_core::prelude::*;

#[derive(Clone)]
pub struct AppState<S, O> {
    pub discovery: DiscoveryService<S, O>,
    pub events: BroadcastObserver,
    pub config: Arc<ServerConfig>,
}
