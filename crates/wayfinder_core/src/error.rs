use thiserror::Error;

/// Failures raised by a [`StorageBackend`](crate::storage::StorageBackend).
#[derive(Error, Debug)]
pub enum StorageError {
    /// Low-level I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A failure of the underlying database, with the original error as its source.
    #[error("Storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Generic system failure that carries no error value of its own.
    #[error("Storage system failure: {0}")]
    System(String),
}

impl StorageError {
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}

/// The error kinds of the discovery core.
///
/// Every condition has its own variant so transport layers can map them without
/// inspecting messages.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// A discovery document already exists for the shell.
    /// Maps to **HTTP 409 Conflict**.
    #[error("Asset links for shell '{0}' already exist")]
    Collision(String),

    /// No discoverable content exists for the shell.
    /// Maps to **HTTP 404 Not Found**.
    #[error("Asset links for shell '{0}' do not exist")]
    NotFound(String),

    /// An identifier cannot be turned into an asset link.
    /// Maps to **HTTP 400 Bad Request**.
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// The storage backend failed. Never retried by the core.
    /// Maps to **HTTP 500 Internal Server Error**.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

impl DiscoveryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
