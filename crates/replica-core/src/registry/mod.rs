//! Boundary to the dataset registry
//!
//! The registry is the system of record for datasets, their file checksums
//! and their content copies. Workflows only talk to it through [`Registry`];
//! [`FileRegistry`] keeps the records in a local JSON, YAML or TOML file and
//! [`MemoryRegistry`] keeps them in memory.

mod file;
mod memory;

pub use file::FileRegistry;
pub use memory::MemoryRegistry;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Whether a dataset holds bytes in the registry or points at replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatasetKind {
    Physical,
    /// Content lives in external replicas listed as content copies
    Link,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => f.write_str("PHYSICAL"),
            Self::Link => f.write_str("LINK"),
        }
    }
}

/// A registered replica of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCopy {
    /// Position in the dataset's copy list
    pub index: usize,
    /// `host` or `host:port`
    pub address: String,
    /// Absolute path of the repository on that host
    pub path: String,
    /// Commit the replica is pinned to
    #[serde(rename = "gitCommitHash")]
    pub commit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,
}

impl ContentCopy {
    /// Host part of the address, without any port.
    pub fn host(&self) -> &str {
        host_of(&self.address)
    }

    /// Last path segment, used as the local folder name of a clone.
    pub fn folder_name(&self) -> Option<&str> {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }
}

/// Host part of a `host[:port]` address.
pub fn host_of(address: &str) -> &str {
    address.split(':').next().unwrap_or(address)
}

/// A content copy to be added to a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContentCopy {
    pub address: String,
    pub path: String,
    pub commit: String,
    /// `<user>@<host>:<path>` of whoever registered the copy
    pub identity: Option<String>,
}

/// Registry view of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    pub perm_id: String,
    pub kind: DatasetKind,
    /// Repository-relative paths of every file in the dataset
    #[serde(default)]
    pub file_list: Vec<String>,
    #[serde(default)]
    pub content_copies: Vec<ContentCopy>,
}

/// Registry checksum record for one file.
///
/// A nonzero `checksum_crc32` takes precedence over `checksum_type` and
/// `checksum`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryFile {
    pub path: String,
    #[serde(rename = "checksumCRC32", default)]
    pub checksum_crc32: Option<u32>,
    #[serde(default)]
    pub checksum_type: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,
}

/// Operations the workflows need from the dataset registry.
pub trait Registry {
    /// Fetch a dataset by its permanent identifier.
    fn get_dataset(&self, perm_id: &str) -> Result<DatasetRecord>;

    /// Checksum records of every file in a dataset.
    fn search_files(&self, dataset_id: &str) -> Result<Vec<RegistryFile>>;

    /// Append a content copy and return it as stored.
    fn register_content_copy(
        &self,
        dataset_id: &str,
        copy: NewContentCopy,
    ) -> Result<ContentCopy>;

    /// Remove the content copy at `index` and return it.
    fn remove_content_copy(&self, dataset_id: &str, index: usize) -> Result<ContentCopy>;

    /// Create a LINK dataset holding `files`, with a fresh permanent id and
    /// no content copies yet.
    fn create_dataset(&self, files: Vec<RegistryFile>) -> Result<DatasetRecord>;
}

/// Stored state shared by the bundled registries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RegistryDocument {
    #[serde(default)]
    pub datasets: Vec<StoredDataset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredDataset {
    #[serde(flatten)]
    pub record: DatasetRecord,
    #[serde(default)]
    pub files: Vec<RegistryFile>,
}

impl RegistryDocument {
    fn dataset(&self, perm_id: &str) -> Result<&StoredDataset> {
        self.datasets
            .iter()
            .find(|d| d.record.perm_id == perm_id)
            .ok_or_else(|| crate::Error::DatasetNotFound {
                dataset: perm_id.to_string(),
            })
    }

    fn dataset_mut(&mut self, perm_id: &str) -> Result<&mut StoredDataset> {
        self.datasets
            .iter_mut()
            .find(|d| d.record.perm_id == perm_id)
            .ok_or_else(|| crate::Error::DatasetNotFound {
                dataset: perm_id.to_string(),
            })
    }

    pub(crate) fn get(&self, perm_id: &str) -> Result<DatasetRecord> {
        self.dataset(perm_id).map(|d| d.record.clone())
    }

    pub(crate) fn files(&self, perm_id: &str) -> Result<Vec<RegistryFile>> {
        self.dataset(perm_id).map(|d| d.files.clone())
    }

    pub(crate) fn push_copy(&mut self, perm_id: &str, copy: NewContentCopy) -> Result<ContentCopy> {
        let dataset = self.dataset_mut(perm_id)?;
        let stored = ContentCopy {
            index: dataset.record.content_copies.len(),
            address: copy.address,
            path: copy.path,
            commit: copy.commit,
            identity: copy.identity,
            registered_at: Some(Utc::now()),
        };
        dataset.record.content_copies.push(stored.clone());
        Ok(stored)
    }

    pub(crate) fn remove_copy(&mut self, perm_id: &str, index: usize) -> Result<ContentCopy> {
        let dataset = self.dataset_mut(perm_id)?;
        let count = dataset.record.content_copies.len();
        if index >= count {
            return Err(crate::Error::ContentCopyIndexOutOfRange {
                dataset: perm_id.to_string(),
                index,
                count,
            });
        }
        let removed = dataset.record.content_copies.remove(index);
        for (position, copy) in dataset.record.content_copies.iter_mut().enumerate() {
            copy.index = position;
        }
        Ok(removed)
    }

    /// Store a new LINK dataset under a `<yyyyMMddHHmmssSSS>-<n>` id.
    pub(crate) fn create(&mut self, files: Vec<RegistryFile>) -> DatasetRecord {
        let stamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
        let mut counter = self.datasets.len() + 1;
        let mut perm_id = format!("{stamp}-{counter}");
        while self.dataset(&perm_id).is_ok() {
            counter += 1;
            perm_id = format!("{stamp}-{counter}");
        }
        let record = DatasetRecord {
            perm_id,
            kind: DatasetKind::Link,
            file_list: files.iter().map(|f| f.path.clone()).collect(),
            content_copies: Vec::new(),
        };
        self.insert(record.clone(), files);
        record
    }

    pub(crate) fn insert(&mut self, record: DatasetRecord, files: Vec<RegistryFile>) {
        self.datasets.retain(|d| d.record.perm_id != record.perm_id);
        self.datasets.push(StoredDataset { record, files });
    }
}
