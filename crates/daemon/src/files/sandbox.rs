//! Containment of client-supplied subpaths inside a shared root.
//!
//! Every request that carries a subpath reaches the filesystem through
//! [`resolve`]. The subpath is joined onto the canonical root segment by
//! segment, `..` is applied lexically, the result is canonicalized (symlinks
//! included, missing tails allowed) and finally compared to the root
//! component-wise. `/share/foo` therefore never admits `/share/foobar`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use soft_canonicalize::soft_canonicalize;

use super::error::FileError;

/// A subpath that has been proven to live inside its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedPath {
    /// Canonical absolute location. May not exist.
    pub absolute: PathBuf,
    /// Normalized `/`-separated path relative to the root. Empty for the root.
    pub relative: String,
}

impl SandboxedPath {
    /// Returns true if this is the root itself.
    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    /// Returns true if any segment below the root is a dot-name.
    pub fn is_hidden(&self) -> bool {
        self.relative.split('/').any(|segment| segment.starts_with('.'))
    }
}

/// Resolve `subpath` against `root`, or fail with [`FileError::Denied`].
///
/// `subpath` is untrusted. Both `/` and `\` separate segments, empty and `.`
/// segments are ignored and a leading separator does not make it absolute.
/// A segment the platform would read as a drive or root is denied.
///
/// Fails with `NotFound` if `root` itself no longer exists.
pub fn resolve(root: &Path, subpath: &str) -> Result<SandboxedPath, FileError> {
    if subpath.contains('\0') {
        return Err(FileError::Denied);
    }

    let canonical_root =
        fs::canonicalize(root).map_err(|e| FileError::from_io(e, "shared root"))?;

    let mut joined = canonical_root.clone();
    for segment in subpath.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                joined.pop();
            }
            name => {
                let mut components = Path::new(name).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => joined.push(name),
                    _ => return Err(FileError::Denied),
                }
            }
        }
    }

    // Lexical escape: reject before touching anything outside the root.
    if !is_contained(&canonical_root, &joined) {
        return Err(FileError::Denied);
    }

    // Symlink escape: the canonical form must still be inside.
    let absolute = soft_canonicalize(&joined).map_err(|e| FileError::from_io(e, "path"))?;
    if !is_contained(&canonical_root, &absolute) {
        return Err(FileError::Denied);
    }

    let relative = joined
        .strip_prefix(&canonical_root)
        .map(to_relative_string)
        .unwrap_or_default();

    Ok(SandboxedPath { absolute, relative })
}

/// Segment-wise containment. A root contains itself.
pub fn is_contained(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

/// Join a relative subpath and a child name with `/`.
pub fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

fn to_relative_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
