//! Shared entry types and the display ordering used by every listing.

use std::cmp::Ordering;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use protocol::messages::{RootItem, DEFAULT_MIME_TYPE, FOLDER_MIME_TYPE};

/// What a shared entry or listed child is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file with its byte length and guessed MIME type.
    File { size: u64, mime_type: String },
    /// A directory. Sizes are not computed recursively.
    Directory,
}

impl EntryKind {
    /// Classify `path` from already-fetched metadata.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File {
                size: metadata.len(),
                mime_type: mime_for(path),
            }
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Byte length for files, 0 for directories.
    pub fn size(&self) -> u64 {
        match self {
            EntryKind::File { size, .. } => *size,
            EntryKind::Directory => 0,
        }
    }

    /// MIME type for files, the `folder` sentinel for directories.
    pub fn mime_type(&self) -> &str {
        match self {
            EntryKind::File { mime_type, .. } => mime_type,
            EntryKind::Directory => FOLDER_MIME_TYPE,
        }
    }
}

/// A top-level shared file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedEntry {
    /// Opaque identifier, unique for the process lifetime.
    pub id: String,
    /// Final path component at registration time.
    pub name: String,
    /// Canonical location at registration time.
    pub absolute_path: PathBuf,
    pub kind: EntryKind,
}

impl SharedEntry {
    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// Convert to the wire representation used by the root listing.
    pub fn to_protocol(&self) -> RootItem {
        RootItem {
            id: self.id.clone(),
            name: self.name.clone(),
            size: self.kind.size(),
            mime_type: self.kind.mime_type().to_string(),
            is_directory: self.is_directory(),
        }
    }
}

/// Guess a MIME type from the file name, falling back to octet-stream.
pub fn mime_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

/// Directories before files, then case-insensitive by name.
///
/// Names equal ignoring case fall back to a byte comparison so the order is
/// total.
pub fn display_order(a_is_dir: bool, a_name: &str, b_is_dir: bool, b_name: &str) -> Ordering {
    match (a_is_dir, b_is_dir) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a_name
            .to_lowercase()
            .cmp(&b_name.to_lowercase())
            .then_with(|| a_name.cmp(b_name)),
    }
}
