//! Process-lifetime table of shared files and directories.
//!
//! The registry is an explicitly constructed service object. The server
//! builds one at startup and hands an `Arc` of it to every request handler;
//! tests build their own. Reads share a `RwLock`, each add and remove holds
//! the write lock for the duration of the table mutation only.

use std::fs;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};
use uuid::Uuid;

use super::entry::{display_order, EntryKind, SharedEntry};
use super::error::FileError;

/// Result of [`ShareRegistry::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// Id of the new entry, or of the existing one for a duplicate.
    pub id: String,
    /// `false` when the path was already shared.
    pub created: bool,
    /// Number of entries after the operation.
    pub count: usize,
}

/// Thread-safe registry of shared entries, in insertion order.
#[derive(Debug, Default)]
pub struct ShareRegistry {
    entries: RwLock<Vec<SharedEntry>>,
}

impl ShareRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Share a file or directory.
    ///
    /// The path is canonicalized before the duplicate check, so two spellings
    /// of the same location are one share. Sharing an already shared path is
    /// idempotent and reports `created = false`.
    pub fn add(&self, target: impl AsRef<Path>) -> Result<AddOutcome, FileError> {
        let target = target.as_ref();
        if target.as_os_str().is_empty() {
            return Err(FileError::InvalidPath(target.to_path_buf()));
        }

        let absolute_path = fs::canonicalize(target).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                FileError::InvalidPath(target.to_path_buf())
            }
            _ => FileError::Internal(e),
        })?;
        let metadata = fs::metadata(&absolute_path)?;

        let name = absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| absolute_path.to_string_lossy().into_owned());
        let kind = EntryKind::from_metadata(&absolute_path, &metadata);

        let mut entries = self.write()?;

        if let Some(existing) = entries.iter().find(|e| e.absolute_path == absolute_path) {
            debug!(id = %existing.id, path = ?absolute_path, "Path already shared");
            return Ok(AddOutcome {
                id: existing.id.clone(),
                created: false,
                count: entries.len(),
            });
        }

        let entry = SharedEntry {
            id: Uuid::new_v4().simple().to_string(),
            name,
            absolute_path,
            kind,
        };

        info!(
            id = %entry.id,
            name = %entry.name,
            directory = entry.is_directory(),
            "Shared {:?}",
            entry.absolute_path
        );

        let id = entry.id.clone();
        entries.push(entry);
        Ok(AddOutcome {
            id,
            created: true,
            count: entries.len(),
        })
    }

    /// Stop sharing an entry.
    ///
    /// Returns the removed entry; an unknown id is not an error.
    pub fn remove(&self, id: &str) -> Result<Option<SharedEntry>, FileError> {
        let mut entries = self.write()?;
        let removed = entries
            .iter()
            .position(|e| e.id == id)
            .map(|index| entries.remove(index));

        if let Some(ref entry) = removed {
            info!(id = %entry.id, name = %entry.name, "Unshared {:?}", entry.absolute_path);
        }
        Ok(removed)
    }

    /// All entries in insertion order.
    pub fn list_root(&self) -> Result<Vec<SharedEntry>, FileError> {
        Ok(self.read()?.clone())
    }

    /// All entries in display order: directories first, then by name.
    pub fn list_root_sorted(&self) -> Result<Vec<SharedEntry>, FileError> {
        let mut entries = self.list_root()?;
        entries.sort_by(|a, b| display_order(a.is_directory(), &a.name, b.is_directory(), &b.name));
        Ok(entries)
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Result<SharedEntry, FileError> {
        self.read()?
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| FileError::NotFound(format!("shared item {}", id)))
    }

    /// Look up an entry that must be a directory.
    pub fn get_directory(&self, id: &str) -> Result<SharedEntry, FileError> {
        let entry = self.get(id)?;
        if !entry.is_directory() {
            return Err(FileError::NotADirectory);
        }
        Ok(entry)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> Result<usize, FileError> {
        Ok(self.read()?.len())
    }

    /// Returns true if nothing is shared.
    pub fn is_empty(&self) -> Result<bool, FileError> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<SharedEntry>>, FileError> {
        self.entries.read().map_err(|_| FileError::LockPoisoned {
            context: "share registry read".to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<SharedEntry>>, FileError> {
        self.entries.write().map_err(|_| FileError::LockPoisoned {
            context: "share registry write".to_string(),
        })
    }
}
