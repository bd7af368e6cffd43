//! Directory listing inside shared folders.
//!
//! Listings are recomputed on every request. The subpath goes through the
//! sandbox before anything on disk is touched, and each child is inspected
//! independently: a child that cannot be inspected is skipped and counted
//! instead of failing the whole listing.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use protocol::messages::{FolderItem, FolderListing};
use tracing::debug;

use super::entry::{display_order, EntryKind};
use super::error::FileError;
use super::registry::ShareRegistry;
use super::sandbox::{self, join_relative};

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedChild {
    /// Entry name (not full path).
    pub name: String,
    /// Path relative to the shared root, usable as the next subpath.
    pub relative_path: String,
    pub kind: EntryKind,
}

impl ListedChild {
    /// Convert to protocol FolderItem.
    pub fn to_protocol(&self) -> FolderItem {
        FolderItem {
            name: self.name.clone(),
            path: self.relative_path.clone(),
            is_directory: self.kind.is_directory(),
            size: self.kind.size(),
            mime_type: self.kind.mime_type().to_string(),
        }
    }
}

/// Result of listing one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Display name of the shared folder.
    pub folder_name: String,
    /// Normalized subpath that was listed.
    pub current_path: String,
    /// Children in display order.
    pub items: Vec<ListedChild>,
    /// Children omitted because they could not be inspected.
    pub skipped: usize,
}

impl DirectoryListing {
    /// Convert to protocol FolderListing.
    pub fn to_protocol(&self) -> FolderListing {
        FolderListing {
            folder_name: self.folder_name.clone(),
            current_path: self.current_path.clone(),
            items: self.items.iter().map(ListedChild::to_protocol).collect(),
            skipped: self.skipped,
        }
    }
}

/// Lists directories of shared folder entries.
pub struct DirectoryBrowser {
    registry: Arc<ShareRegistry>,
    /// Whether names starting with '.' are listed.
    include_hidden: bool,
}

impl DirectoryBrowser {
    /// Create a browser over the given registry. Hidden files are listed.
    pub fn new(registry: Arc<ShareRegistry>) -> Self {
        Self {
            registry,
            include_hidden: true,
        }
    }

    /// Set whether dot-files are listed.
    ///
    /// When off, a subpath through a dot-name is also reported as missing.
    /// [`ContentResolver`](super::ContentResolver) applies the same rule to
    /// downloads.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// List the immediate children of `subpath` inside shared folder `entry_id`.
    pub fn list(&self, entry_id: &str, subpath: &str) -> Result<DirectoryListing, FileError> {
        let entry = self.registry.get_directory(entry_id)?;
        let resolved = sandbox::resolve(&entry.absolute_path, subpath)?;
        if !self.include_hidden && resolved.is_hidden() {
            return Err(FileError::NotFound("path".into()));
        }

        let metadata =
            fs::metadata(&resolved.absolute).map_err(|e| FileError::from_io(e, "path"))?;
        if !metadata.is_dir() {
            return Err(FileError::NotADirectory);
        }

        let read_dir =
            fs::read_dir(&resolved.absolute).map_err(|e| FileError::from_io(e, "path"))?;
        let root = fs::canonicalize(&entry.absolute_path)
            .map_err(|e| FileError::from_io(e, "shared root"))?;

        let mut items = Vec::new();
        let mut skipped = 0;

        for dir_entry in read_dir {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable directory entry: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if !self.include_hidden && name.starts_with('.') {
                continue;
            }

            match inspect_child(&root, &dir_entry.path()) {
                Some(kind) => items.push(ListedChild {
                    relative_path: join_relative(&resolved.relative, &name),
                    name,
                    kind,
                }),
                None => {
                    debug!(share = %entry.id, child = %name, "Skipping child that cannot be inspected");
                    skipped += 1;
                }
            }
        }

        items.sort_by(|a, b| {
            display_order(a.kind.is_directory(), &a.name, b.kind.is_directory(), &b.name)
        });

        Ok(DirectoryListing {
            folder_name: entry.name,
            current_path: resolved.relative,
            items,
            skipped,
        })
    }
}

/// Stat a child, following symlinks.
///
/// Returns `None` for children that vanished, cannot be stat'ed, are broken
/// symlinks, or are symlinks leading outside the shared root.
fn inspect_child(root: &Path, path: &Path) -> Option<EntryKind> {
    let link_metadata = fs::symlink_metadata(path).ok()?;
    if link_metadata.file_type().is_symlink() {
        let target = fs::canonicalize(path).ok()?;
        if !sandbox::is_contained(root, &target) {
            return None;
        }
    }

    let metadata = fs::metadata(path).ok()?;
    Some(EntryKind::from_metadata(path, &metadata))
}
