//! Host filesystem browsing for the admin path picker.
//!
//! Unlike [`super::browser`], this walks arbitrary host paths and is only
//! meant for the operator choosing what to share.

use std::fs;
use std::path::Path;

use protocol::messages::BrowseEntry;

use super::entry::display_order;
use super::error::FileError;

/// List the children of a host directory, directories first.
///
/// Fails with `InvalidPath` when `dir` is empty or does not exist.
pub fn browse(dir: &str) -> Result<Vec<BrowseEntry>, FileError> {
    let dir_path = Path::new(dir);
    if dir.is_empty() || !dir_path.exists() {
        return Err(FileError::InvalidPath(dir_path.to_path_buf()));
    }

    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(dir_path)? {
        let Ok(dir_entry) = dir_entry else { continue };
        let path = dir_entry.path();
        let is_directory = match dir_entry.file_type() {
            Ok(t) if t.is_symlink() => path.is_dir(),
            Ok(t) => t.is_dir(),
            Err(_) => continue,
        };
        entries.push(BrowseEntry {
            name: dir_entry.file_name().to_string_lossy().into_owned(),
            is_directory,
            path: path.to_string_lossy().into_owned(),
        });
    }

    entries.sort_by(|a, b| display_order(a.is_directory, &a.name, b.is_directory, &b.name));
    Ok(entries)
}

/// Filesystem roots the picker can start from.
#[cfg(windows)]
pub fn drives() -> Vec<String> {
    (b'A'..=b'Z')
        .map(|letter| format!("{}:", letter as char))
        .filter(|drive| Path::new(&format!("{}\\", drive)).exists())
        .collect()
}

/// Filesystem roots the picker can start from.
#[cfg(not(windows))]
pub fn drives() -> Vec<String> {
    vec!["/".to_string()]
}
