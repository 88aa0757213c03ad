//! Registry kept in a local document
//!
//! The document format follows the file extension (`.json`, `.yaml`/`.yml`
//! or `.toml`).

use std::path::Path;

use replica_fs::{ConfigStore, NormalizedPath};

use super::{
    ContentCopy, DatasetRecord, NewContentCopy, Registry, RegistryDocument, RegistryFile,
};
use crate::{Error, Result};

/// File-backed registry.
///
/// Every read loads the document afresh and every write replaces it
/// atomically, so concurrent processes never see a half-written file.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: NormalizedPath,
    store: ConfigStore,
}

impl FileRegistry {
    /// Open the registry document at `path`. It must exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = NormalizedPath::new(path);
        if !path.is_file() {
            return Err(Error::Registry {
                message: format!("registry file {path} does not exist"),
            });
        }
        Ok(Self {
            path,
            store: ConfigStore::new(),
        })
    }

    /// Create an empty registry document at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = NormalizedPath::new(path);
        let store = ConfigStore::new();
        store.save(&path, &RegistryDocument::default())?;
        tracing::info!(path = %path, "Created registry");
        Ok(Self { path, store })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Add or replace a dataset together with its file records.
    pub fn put_dataset(&self, record: DatasetRecord, files: Vec<RegistryFile>) -> Result<()> {
        self.update(|document| {
            document.insert(record, files);
            Ok(())
        })
    }

    fn load(&self) -> Result<RegistryDocument> {
        Ok(self.store.load(&self.path)?)
    }

    fn update<T>(&self, change: impl FnOnce(&mut RegistryDocument) -> Result<T>) -> Result<T> {
        let mut document = self.load()?;
        let value = change(&mut document)?;
        self.store.save(&self.path, &document)?;
        Ok(value)
    }
}

impl Registry for FileRegistry {
    fn get_dataset(&self, perm_id: &str) -> Result<DatasetRecord> {
        self.load()?.get(perm_id)
    }

    fn search_files(&self, dataset_id: &str) -> Result<Vec<RegistryFile>> {
        self.load()?.files(dataset_id)
    }

    fn register_content_copy(
        &self,
        dataset_id: &str,
        copy: NewContentCopy,
    ) -> Result<ContentCopy> {
        let stored = self.update(|document| document.push_copy(dataset_id, copy))?;
        tracing::info!(
            dataset = dataset_id,
            index = stored.index,
            address = %stored.address,
            path = %stored.path,
            "Registered content copy"
        );
        Ok(stored)
    }

    fn remove_content_copy(&self, dataset_id: &str, index: usize) -> Result<ContentCopy> {
        let removed = self.update(|document| document.remove_copy(dataset_id, index))?;
        tracing::info!(
            dataset = dataset_id,
            address = %removed.address,
            path = %removed.path,
            "Removed content copy"
        );
        Ok(removed)
    }

    fn create_dataset(&self, files: Vec<RegistryFile>) -> Result<DatasetRecord> {
        let record = self.update(|document| Ok(document.create(files)))?;
        tracing::info!(
            dataset = %record.perm_id,
            files = record.file_list.len(),
            "Created data set"
        );
        Ok(record)
    }
}
