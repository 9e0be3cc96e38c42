//! # Wayfinder Core
//! [![Crates.io](https://img.shields.io/crates/v/wayfinder_core.svg)](https://crates.io/crates/wayfinder_core)
//! [![Docs](https://docs.rs/wayfinder_core/badge.svg)](https://docs.rs/wayfinder_core/)
//!
//! Types, traits and the discovery service itself.
//!
//! Answers "which shells describe the asset carrying these identifiers?".
//!
//! - **[`DiscoveryService`](service::DiscoveryService)**: Creates, reads, deletes and queries asset links per shell.
//! - **[`StorageBackend`](storage::StorageBackend)**: Trait for implementing persistence layers (e.g., sled, Filesystem).
//! - **[`DiscoveryObserver`](observer::DiscoveryObserver)**: Trait for reacting to link changes.
//! - **[`ShellLinker`](linker::ShellLinker)**: Keeps the index in step with a shell repository.
//! - **[`InMemoryStorage`](memory::InMemoryStorage)**: Process-local backend, useful for tests and small deployments.

pub mod config;
pub mod constants;
pub mod derive;
pub mod error;
pub mod guard;
pub mod linker;
pub mod memory;
pub mod model;
pub mod observer;
pub mod pagination;
pub mod service;
pub mod storage;

#[cfg(feature = "testing")]
pub mod testing;

pub mod prelude {
    pub use super::config::*;
    pub use super::constants;
    pub use super::derive::*;
    pub use super::error::*;
    pub use super::linker::*;
    pub use super::memory::*;
    pub use super::model::*;
    pub use super::observer::*;
    pub use super::pagination::*;
    pub use super::service::*;
    pub use super::storage::*;
}
