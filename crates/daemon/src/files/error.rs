//! Error taxonomy shared by the sandbox, registry, browser and resolver.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving shared content.
#[derive(Debug, Error)]
pub enum FileError {
    /// The admin supplied a path that does not exist.
    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),

    /// A share id or subpath does not resolve to an existing filesystem object.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation needs a directory but the target is a file.
    #[error("not a directory")]
    NotADirectory,

    /// The operation needs a file but the target is a directory.
    #[error("is a directory")]
    IsADirectory,

    /// A subpath tried to escape its shared root.
    ///
    /// Never carries the attempted path.
    #[error("access denied")]
    Denied,

    /// Unexpected OS error while inspecting the primary target.
    #[error("internal error: {0}")]
    Internal(#[from] io::Error),

    /// The registry lock was poisoned by a panicking writer.
    #[error("lock poisoned: {context}")]
    LockPoisoned { context: String },
}

impl FileError {
    /// Map an I/O error on the primary target of an operation.
    ///
    /// A missing object, or a path that walks through a regular file, is
    /// `NotFound`; anything else is internal.
    pub(crate) fn from_io(err: io::Error, what: impl Into<String>) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
                FileError::NotFound(what.into())
            }
            _ => FileError::Internal(err),
        }
    }

    /// Returns true for errors that mean "nothing there" from the client's view.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileError::NotFound(_) | FileError::IsADirectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_display_has_no_path() {
        assert_eq!(FileError::Denied.to_string(), "access denied");
    }

    #[test]
    fn test_from_io_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            FileError::from_io(err, "path"),
            FileError::NotFound(what) if what == "path"
        ));
    }

    #[test]
    fn test_from_io_other_is_internal() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            FileError::from_io(err, "path"),
            FileError::Internal(_)
        ));
    }

    #[test]
    fn test_is_not_found() {
        assert!(FileError::NotFound("x".into()).is_not_found());
        assert!(FileError::IsADirectory.is_not_found());
        assert!(!FileError::Denied.is_not_found());
        assert!(!FileError::NotADirectory.is_not_found());
    }
}
