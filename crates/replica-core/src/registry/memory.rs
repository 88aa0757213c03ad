//! In-process registry

use std::sync::{Mutex, MutexGuard};

use super::{
    ContentCopy, DatasetRecord, NewContentCopy, Registry, RegistryDocument, RegistryFile,
};
use crate::Result;

/// Registry held in memory, counting the calls made against it.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    document: Mutex<RegistryDocument>,
    calls: Mutex<CallLog>,
}

#[derive(Debug, Default, Clone)]
struct CallLog {
    get_dataset: usize,
    search_files: usize,
    registrations: Vec<NewContentCopy>,
    removals: Vec<usize>,
    created: Vec<String>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset with its file records.
    pub fn with_dataset(self, record: DatasetRecord, files: Vec<RegistryFile>) -> Self {
        self.document().insert(record, files);
        self
    }

    /// Replace the file records of an existing dataset.
    pub fn set_files(&self, perm_id: &str, files: Vec<RegistryFile>) -> Result<()> {
        let mut document = self.document();
        let record = document.get(perm_id)?;
        document.insert(record, files);
        Ok(())
    }

    /// Content copies registered through this handle, in call order.
    pub fn registrations(&self) -> Vec<NewContentCopy> {
        self.calls().registrations.clone()
    }

    /// Indices passed to `remove_content_copy`, in call order.
    pub fn removals(&self) -> Vec<usize> {
        self.calls().removals.clone()
    }

    /// Permanent ids handed out by `create_dataset`, in call order.
    pub fn created(&self) -> Vec<String> {
        self.calls().created.clone()
    }

    pub fn get_dataset_calls(&self) -> usize {
        self.calls().get_dataset
    }

    pub fn search_files_calls(&self) -> usize {
        self.calls().search_files
    }

    // A poisoned lock still holds consistent data: every mutation is a
    // single push or remove.
    fn document(&self) -> MutexGuard<'_, RegistryDocument> {
        self.document.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn calls(&self) -> MutexGuard<'_, CallLog> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Registry for MemoryRegistry {
    fn get_dataset(&self, perm_id: &str) -> Result<DatasetRecord> {
        self.calls().get_dataset += 1;
        self.document().get(perm_id)
    }

    fn search_files(&self, dataset_id: &str) -> Result<Vec<RegistryFile>> {
        self.calls().search_files += 1;
        self.document().files(dataset_id)
    }

    fn register_content_copy(
        &self,
        dataset_id: &str,
        copy: NewContentCopy,
    ) -> Result<ContentCopy> {
        self.calls().registrations.push(copy.clone());
        self.document().push_copy(dataset_id, copy)
    }

    fn remove_content_copy(&self, dataset_id: &str, index: usize) -> Result<ContentCopy> {
        self.calls().removals.push(index);
        self.document().remove_copy(dataset_id, index)
    }

    fn create_dataset(&self, files: Vec<RegistryFile>) -> Result<DatasetRecord> {
        let record = self.document().create(files);
        self.calls().created.push(record.perm_id.clone());
        Ok(record)
    }
}
