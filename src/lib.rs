//! # 🧭 Wayfinder
//![![License](https://img.shields.io/badge/license-MIT%2FApache-blue.svg)](https://github.com/NicoZweifel/wayfinder?tab=readme-ov-file#license)
//![![Crates.io](https://img.shields.io/crates/v/wayfinder.svg)](https://crates.io/crates/wayfinder)
//![![Docs](https://docs.rs/wayfinder/badge.svg)](https://docs.rs/wayfinder/)
//!
//!> *Which shell describes this asset?*
//!
//! An asset-link discovery service. Shells register the identifiers of their asset (serial
//! numbers, global asset ids, ...) and clients look shells up by any of those identifiers.
//!
//! This crate serves as an entry point, re-exporting the core logic and
//! optionally including the server and storage implementations via feature flags.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **`server`** | Includes the Axum-based lookup server (`wayfinder_server`). |
//! | **`fs`** | Storage backend for the local filesystem (`wayfinder_fs`). |
//! | **`sled`** | Storage backend on the sled embedded database (`wayfinder_sled`). |
//!
//! The in-memory backend is always available.
//!
//! ## Example: Custom Server
//!
//! ```toml
//! [dependencies]
//! wayfinder = { version = "0.3", features = ["server", "sled"] }
//! ```
//!
//! ```rust,no_run
//! use wayfinder::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = SledStorage::open("./wayfinder_data").unwrap();
//!     let events = BroadcastObserver::default();
//!     let discovery =
//!         DiscoveryService::with_observer(storage, events.clone(), DiscoveryConfig::default());
//!
//!     // Build
//!     let app = WayfinderServer::default().build(discovery, events);
//!
//!     // Serve
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8081").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub use wayfinder_core::*;

#[cfg(feature = "server")]
pub mod server {
    pub use wayfinder_server::*;
}

#[cfg(feature = "fs")]
pub mod fs {
    pub use wayfinder_fs::*;
}

#[cfg(feature = "sled")]
pub mod sled {
    pub use wayfinder_sled::*;
}

pub mod prelude {
    pub use wayfinder_core::prelude::*;

    #[cfg(feature = "server")]
    pub use wayfinder_server::prelude::*;

    #[cfg(feature = "fs")]
    pub use wayfinder_fs::FileSystemStorage;

    #[cfg(feature = "sled")]
    pub use wayfinder_sled::SledStorage;
}
