//! # Wayfinder Sled
//! [![Crates.io](https://img.shields.io/crates/v/wayfinder_sled.svg)](https://crates.io/crates/wayfinder_sled)
//! [![Docs](https://docs.rs/wayfinder_sled/badge.svg)](https://docs.rs/wayfinder_sled/)
//!
//! A [`StorageBackend`] on the [sled](https://docs.rs/sled) embedded database.
//!
//! Documents live in the `documents` tree keyed by shell id. A second tree, `links`, indexes every
//! asset link as `len(name) name len(value) value shell_id`, so a link lookup is a prefix scan.
//! Both trees are updated in one transaction.
//!
//! sled's API is synchronous. Every read, scan and transaction runs on tokio's blocking pool via
//! [`spawn_blocking`](tokio::task::spawn_blocking), keeping disk I/O off the async
//! workers. Only the final flush uses sled's own async API.

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::ops::Bound;
use std::path::Path;
use tracing::{debug, warn};
use wayfinder_core::prelude::*;

const DOCUMENTS: &str = "documents";
const LINKS: &str = "links";

#[derive(Clone)]
pub struct SledStorage {
    db: Db,
    documents: Tree,
    links: Tree,
}

fn from_transaction(err: TransactionError<StorageError>) -> StorageError {
    match err {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(err) => StorageError::backend(err),
    }
}

fn link_prefix(link: &AssetLink) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + link.name.len() + link.value.len());
    for part in [&link.name, &link.value] {
        key.extend_from_slice(&(part.len() as u32).to_be_bytes());
        key.extend_from_slice(part.as_bytes());
    }
    key
}

fn index_key(link: &AssetLink, shell_id: &str) -> Vec<u8> {
    let mut key = link_prefix(link);
    key.extend_from_slice(shell_id.as_bytes());
    key
}

fn decode(bytes: &[u8]) -> Result<DiscoveryDocument, StorageError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn read_document(documents: &Tree, shell_id: &str) -> Result<Option<DiscoveryDocument>, StorageError> {
    documents
        .get(shell_id.as_bytes())
        .map_err(StorageError::backend)?
        .map(|value| decode(&value))
        .transpose()
}

/// Runs synchronous sled work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(StorageError::backend)?
}

impl SledStorage {
    /// Opens (or creates) a database directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::from_db(sled::open(path).map_err(StorageError::backend)?)
    }

    /// A database that is removed when the last handle is dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(StorageError::backend)?;
        Self::from_db(db)
    }

    pub fn from_db(db: Db) -> Result<Self, StorageError> {
        let documents = db.open_tree(DOCUMENTS).map_err(StorageError::backend)?;
        let links = db.open_tree(LINKS).map_err(StorageError::backend)?;
        debug!(documents = documents.len(), "opened sled storage");
        Ok(Self {
            db,
            documents,
            links,
        })
    }

    async fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush_async()
            .await
            .map_err(StorageError::backend)?;
        Ok(())
    }
}

impl StorageBackend for SledStorage {
    async fn save(&self, document: DiscoveryDocument) -> Result<(), StorageError> {
        let value = serde_json::to_vec(&document)?;
        let trees = (self.documents.clone(), self.links.clone());

        blocking(move || {
            let shell_id = document.shell_id.as_str();
            (&trees.0, &trees.1)
                .transaction(|(documents, links)| {
                    if let Some(previous) = documents.insert(shell_id.as_bytes(), &value[..])? {
                        let previous =
                            decode(&previous).map_err(ConflictableTransactionError::Abort)?;
                        for link in &previous.asset_links {
                            links.remove(index_key(link, shell_id))?;
                        }
                    }
                    for link in &document.asset_links {
                        links.insert(index_key(link, shell_id), &b""[..])?;
                    }
                    Ok(())
                })
                .map_err(from_transaction)
        })
        .await?;

        self.flush().await
    }

    async fn find_by_id(&self, shell_id: &str) -> Result<Option<DiscoveryDocument>, StorageError> {
        let documents = self.documents.clone();
        let shell_id = shell_id.to_owned();

        blocking(move || read_document(&documents, &shell_id)).await
    }

    async fn exists_by_id(&self, shell_id: &str) -> Result<bool, StorageError> {
        let documents = self.documents.clone();
        let shell_id = shell_id.to_owned();

        blocking(move || {
            documents
                .contains_key(shell_id.as_bytes())
                .map_err(StorageError::backend)
        })
        .await
    }

    async fn find_all_matching_any(
        &self,
        links: &BTreeSet<AssetLink>,
    ) -> Result<Vec<DiscoveryDocument>, StorageError> {
        let (documents, index) = (self.documents.clone(), self.links.clone());
        let links = links.clone();

        blocking(move || {
            let mut shell_ids = BTreeSet::new();
            for link in &links {
                let prefix = link_prefix(link);
                for entry in index.scan_prefix(&prefix) {
                    let (key, _) = entry.map_err(StorageError::backend)?;
                    let shell_id =
                        std::str::from_utf8(&key[prefix.len()..]).map_err(StorageError::backend)?;
                    shell_ids.insert(shell_id.to_owned());
                }
            }

            let mut found = Vec::with_capacity(shell_ids.len());
            for shell_id in shell_ids {
                match read_document(&documents, &shell_id)? {
                    Some(document) => found.push(document),
                    // Removed between the index scan and the read.
                    None => warn!(%shell_id, "indexed shell has no document"),
                }
            }
            Ok(found)
        })
        .await
    }

    async fn find_all(&self) -> Result<Vec<DiscoveryDocument>, StorageError> {
        let documents = self.documents.clone();

        blocking(move || {
            documents
                .iter()
                .values()
                .map(|value| decode(&value.map_err(StorageError::backend)?))
                .collect()
        })
        .await
    }

    async fn delete_by_id(&self, shell_id: &str) -> Result<(), StorageError> {
        let trees = (self.documents.clone(), self.links.clone());
        let shell_id = shell_id.to_owned();

        blocking(move || {
            (&trees.0, &trees.1)
                .transaction(|(documents, links)| {
                    if let Some(previous) = documents.remove(shell_id.as_bytes())? {
                        let previous =
                            decode(&previous).map_err(ConflictableTransactionError::Abort)?;
                        for link in &previous.asset_links {
                            links.remove(index_key(link, &shell_id))?;
                        }
                    }
                    Ok(())
                })
                .map_err(from_transaction)
        })
        .await?;

        self.flush().await
    }

    async fn find_after(
        &self,
        cursor: Option<&str>,
        limit: Option<NonZeroUsize>,
    ) -> Result<CursorPage<DiscoveryDocument>, StorageError> {
        let documents = self.documents.clone();
        let cursor = cursor.map(str::to_owned);

        let resumed = blocking(move || {
            let lower = match &cursor {
                Some(cursor) => Bound::Excluded(cursor.as_bytes()),
                None => Bound::Unbounded,
            };
            let range = documents.range::<&[u8], _>((lower, Bound::Unbounded));

            // One extra document tells whether another page follows.
            let wanted = limit.map_or(usize::MAX, |limit| limit.get().saturating_add(1));
            range
                .values()
                .take(wanted)
                .map(|value| decode(&value.map_err(StorageError::backend)?))
                .collect::<Result<Vec<_>, _>>()
        })
        .await?;

        Ok(CursorPaginator::page(resumed, limit))
    }
}
