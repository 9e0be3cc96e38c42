//! # Wayfinder Server
//! [![Crates.io](https://img.shields.io/crates/v/wayfinder_server.svg)](https://crates.io/crates/wayfinder_server)
//! [![Docs](https://docs.rs/wayfinder_server/badge.svg)](https://docs.rs/wayfinder_server/)
//!
//! An Axum-based discovery server implementing the asset-link lookup interface.
//!
//! Provides the [`WayfinderServer`] builder, which ties a [`DiscoveryService`] to HTTP routes.
//!
//! ## Routes
//!
//! * **`GET /lookup/shells`**: shell ids by asset links (`assetIds`, `limit`, `cursor`).
//! * **`GET|POST|DELETE /lookup/shells/{aasIdentifier}`**: asset links of one shell.
//! * **`GET /lookup/documents`**: every stored discovery document, paged.
//! * **`GET /lookup/events`**: websocket stream of link changes.
//!
//! Shell ids in paths and cursors are base64url-encoded.
//!
//! ## Example
//!
//! ```no_run
//! use wayfinder_server::prelude::*;
//! use wayfinder_core::prelude::*;
//!
//! # async fn run() {
//! let events = BroadcastObserver::default();
//! let discovery = DiscoveryService::with_observer(
//!     InMemoryStorage::new(),
//!     events.clone(),
//!     DiscoveryConfig::default(),
//! );
//!
//! let app = WayfinderServer::default().build(discovery, events);
//! # }
//! ```
//!
//! [`DiscoveryService`]: wayfinder_core::service::DiscoveryService

mod api;
mod server;

pub mod encoding;
pub mod events;
pub mod state;

pub use api::{ApiError, ServiceDescription};
pub use server::{ServerConfig, WayfinderServer};

pub mod prelude {
    pub use crate::encoding::*;
    pub use crate::events::*;
    pub use crate::state::*;
    pub use crate::{ServerConfig, WayfinderServer};
}
