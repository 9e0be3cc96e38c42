//! # Wayfinder FileSystem Storage
//! [![Crates.io](https://img.shields.io/crates/v/wayfinder_fs.svg)](https://crates.io/crates/wayfinder_fs)
//! [![Docs](https://docs.rs/wayfinder_fs/badge.svg)](https://docs.rs/wayfinder_fs/)
//!
//! A local filesystem backend for Wayfinder.
//!
//! This crate implements the [`StorageBackend`] trait, storing one JSON file per discovery
//! document. File names are the hex-encoded SHA-256 of the shell id, so identifiers of any
//! length (URNs, URLs, ...) map to a fixed 64-character name that is valid on every filesystem.
//! The shell id itself is kept inside the document; listings read it from there.
//!
//! ## Features
//!
//! * **Atomic Writes**: Uses temporary files and rename operations so a document is never read partially.
//!
//! Link queries scan every document; use the sled backend for large indexes.
//!
//! ## Usage
//!
//! ```no_run
//! use wayfinder_fs::FileSystemStorage;
//!
//! let storage = FileSystemStorage::new("./wayfinder_data");
//! ```

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;
use wayfinder_core::prelude::*;

const EXTENSION: &str = "json";

async fn atomic_write(path: &Path, data: Bytes) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(StorageError::Io)?;
    }

    let tmp_path = path.with_extension("tmp");

    fs::write(&tmp_path, data).await.map_err(StorageError::Io)?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(StorageError::Io)?;

    Ok(())
}

#[derive(Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { root: path.into() }
    }

    fn get_path(&self, shell_id: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(shell_id.as_bytes());
        let hash = hex::encode(hasher.finalize());

        self.root.join(format!("{hash}.{EXTENSION}"))
    }

    async fn read_document(&self, path: &Path) -> Result<Option<DiscoveryDocument>, StorageError> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Every stored document keyed by shell id, ascending.
    ///
    /// Files that do not decode to a document stored under its own digest are skipped.
    async fn documents(&self) -> Result<BTreeMap<String, DiscoveryDocument>, StorageError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut documents = BTreeMap::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }

            // Deleted since the directory was listed.
            let document = match self.read_document(&path).await {
                Ok(Some(document)) => document,
                Ok(None) => continue,
                Err(StorageError::Serialization(e)) => {
                    warn!(path = %path.display(), "ignoring foreign file in storage directory: {e}");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if self.get_path(&document.shell_id) != path {
                warn!(path = %path.display(), shell_id = %document.shell_id, "ignoring misplaced document");
                continue;
            }
            documents.insert(document.shell_id.clone(), document);
        }
        Ok(documents)
    }
}

impl StorageBackend for FileSystemStorage {
    async fn save(&self, document: DiscoveryDocument) -> Result<(), StorageError> {
        let path = self.get_path(&document.shell_id);
        let data = Bytes::from(serde_json::to_vec(&document)?);
        atomic_write(&path, data).await
    }

    async fn find_by_id(&self, shell_id: &str) -> Result<Option<DiscoveryDocument>, StorageError> {
        self.read_document(&self.get_path(shell_id)).await
    }

    async fn exists_by_id(&self, shell_id: &str) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.get_path(shell_id)).await?)
    }

    async fn find_all_matching_any(
        &self,
        links: &BTreeSet<AssetLink>,
    ) -> Result<Vec<DiscoveryDocument>, StorageError> {
        let mut documents = self.find_all().await?;
        documents.retain(|document| document.matches_any(links));
        Ok(documents)
    }

    async fn find_all(&self) -> Result<Vec<DiscoveryDocument>, StorageError> {
        Ok(self.documents().await?.into_values().collect())
    }

    async fn delete_by_id(&self, shell_id: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.get_path(shell_id)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(StorageError::Io(e)),
            _ => Ok(()),
        }
    }

    async fn find_after(
        &self,
        cursor: Option<&str>,
        limit: Option<NonZeroUsize>,
    ) -> Result<CursorPage<DiscoveryDocument>, StorageError> {
        let documents = self.documents().await?;
        let info = PaginationInfo::new(limit, cursor.map(str::to_owned));

        Ok(CursorPaginator::paginate_map(&documents, &info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(shell_id: &str) -> DiscoveryDocument {
        DiscoveryDocument {
            shell_id: shell_id.into(),
            asset_links: Default::default(),
            identifiers: vec![],
        }
    }

    #[test]
    fn file_names_have_a_fixed_length() {
        let storage = FileSystemStorage::new("/data");
        let long = format!("https://example.com/ids/aas/{}", "x".repeat(2000));

        for shell_id in ["", "aas-1", "a/b", long.as_str()] {
            let path = storage.get_path(shell_id);
            let name = path.file_name().and_then(|name| name.to_str()).unwrap();

            assert_eq!(name.len(), 64 + 1 + EXTENSION.len(), "{shell_id}");
            assert_eq!(path.parent(), Some(Path::new("/data")));
        }
        assert_ne!(storage.get_path("aas-1"), storage.get_path("aas-2"));
    }

    #[tokio::test]
    async fn long_shell_ids_are_stored_and_listed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path());
        let long = format!("https://example.com/ids/aas/{}", "x".repeat(2000));

        storage.save(document(&long)).await.unwrap();
        storage.save(document("aas-1")).await.unwrap();

        assert!(storage.exists_by_id(&long).await.unwrap());
        assert_eq!(storage.find_by_id(&long).await.unwrap().unwrap().shell_id, long);
        let ids: Vec<String> = storage
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|document| document.shell_id)
            .collect();
        assert_eq!(ids, vec!["aas-1".to_string(), long.clone()]);

        let page = storage
            .find_after(Some("aas-1"), NonZeroUsize::new(1))
            .await
            .unwrap();
        assert_eq!(page.items[0].shell_id, long);
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn ignores_temporary_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path());
        storage.save(document("aas-1")).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("zz.json"), "{}").unwrap();
        std::fs::write(storage.get_path("aas-2").with_extension("tmp"), "{").unwrap();
        std::fs::copy(storage.get_path("aas-1"), dir.path().join("copy.json")).unwrap();

        let all = storage.find_all().await.unwrap();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].shell_id, "aas-1");
    }

    #[tokio::test]
    async fn missing_root_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path().join("not-yet-created"));

        assert!(storage.find_all().await.unwrap().is_empty());
        assert!(storage.find_after(None, None).await.unwrap().is_last());
        storage.delete_by_id("aas-1").await.unwrap();
    }
}
