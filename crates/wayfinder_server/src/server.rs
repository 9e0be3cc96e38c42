use crate::api;
use crate::events::BroadcastObserver;
use crate::state::AppState;

use axum::{Router, routing::get};
use std::net::{Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use wayfinder_core::constants::{defaults, routes};
use wayfinder_core::prelude::*;

/// The builder for the Wayfinder Server.
#[derive(Clone, Debug, Default)]
pub struct WayfinderServer {
    config: ServerConfig,
}

impl WayfinderServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the binary listens on.
    ///
    /// Defaults to `0.0.0.0:8081`.
    pub bind: SocketAddr,

    /// Page size when a request carries no `limit`.
    ///
    /// Defaults to `100`.
    pub default_limit: NonZeroUsize,

    /// Events buffered per websocket subscriber before the oldest are dropped.
    pub event_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8081)),
            default_limit: NonZeroUsize::new(defaults::PAGE_LIMIT).unwrap_or(NonZeroUsize::MIN),
            event_capacity: 256,
        }
    }
}

impl WayfinderServer {
    /// Builds the router.
    ///
    /// `events` feeds `/lookup/events`; it only carries something if it is (part of) the
    /// observer of `discovery`.
    pub fn build<S, O>(self, discovery: DiscoveryService<S, O>, events: BroadcastObserver) -> Router
    where
        S: StorageBackend,
        O: DiscoveryObserver,
    {
        let state = AppState {
            discovery,
            events,
            config: Arc::new(self.config),
        };

        Router::new()
            .route(routes::HEALTH, get(|| async { "OK" }))
            .route(routes::DESCRIPTION, get(api::description::<S, O>))
            .route(routes::SHELLS, get(api::get_shells_by_asset_links::<S, O>))
            .route(
                routes::SHELLS_BY_ID,
                get(api::get_asset_links::<S, O>)
                    .post(api::post_asset_links::<S, O>)
                    .delete(api::delete_asset_links::<S, O>),
            )
            .route(routes::DOCUMENTS, get(api::list_documents::<S, O>))
            .route(routes::EVENTS, get(api::events::<S, O>))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
