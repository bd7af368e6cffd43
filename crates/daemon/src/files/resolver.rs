//! Resolution of download requests to concrete files and directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::entry::{mime_for, EntryKind};
use super::error::FileError;
use super::registry::ShareRegistry;
use super::sandbox::{self, SandboxedPath};

/// A file ready to be streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub absolute_path: PathBuf,
    /// Name offered to the client in `Content-Disposition`.
    pub file_name: String,
    pub mime_type: String,
    /// Length at resolution time.
    pub size: u64,
}

/// A directory ready to be archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDirectory {
    pub absolute_path: PathBuf,
    /// Final component, used as the archive name and entry prefix.
    pub name: String,
    /// Whether dot-names below `absolute_path` belong in the archive.
    pub include_hidden: bool,
}

/// Turns share ids and subpaths into filesystem locations.
pub struct ContentResolver {
    registry: Arc<ShareRegistry>,
    include_hidden: bool,
}

impl ContentResolver {
    /// Create a resolver over the given registry. Hidden files are served.
    pub fn new(registry: Arc<ShareRegistry>) -> Self {
        Self {
            registry,
            include_hidden: true,
        }
    }

    /// Set whether dot-names inside shared folders can be downloaded.
    ///
    /// When off, a subpath through a dot-name is reported as missing and
    /// archives leave dot-names out.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Resolve a shared file entry.
    ///
    /// The entry itself must be a file. Its stored MIME type is reused and
    /// its existence is rechecked.
    pub fn resolve_file(&self, entry_id: &str) -> Result<ResolvedFile, FileError> {
        let entry = self.registry.get(entry_id)?;
        let mime_type = match &entry.kind {
            EntryKind::File { mime_type, .. } => mime_type.clone(),
            EntryKind::Directory => return Err(FileError::IsADirectory),
        };

        // The file may have moved since it was shared.
        let metadata = fs::metadata(&entry.absolute_path)
            .map_err(|e| FileError::from_io(e, format!("shared item {}", entry.id)))?;
        if metadata.is_dir() {
            return Err(FileError::IsADirectory);
        }

        Ok(ResolvedFile {
            absolute_path: entry.absolute_path,
            file_name: entry.name,
            mime_type,
            size: metadata.len(),
        })
    }

    /// Resolve a file inside shared folder `entry_id`.
    ///
    /// The entry must be a directory, even for an empty subpath, so a file
    /// entry is never served through this route. The MIME type is derived
    /// from the resolved name.
    pub fn resolve_folder_file(
        &self,
        entry_id: &str,
        subpath: &str,
    ) -> Result<ResolvedFile, FileError> {
        let entry = self.registry.get_directory(entry_id)?;
        let resolved = self.sandboxed(&entry.absolute_path, subpath)?;

        let metadata =
            fs::metadata(&resolved.absolute).map_err(|e| FileError::from_io(e, "path"))?;
        if metadata.is_dir() {
            return Err(FileError::IsADirectory);
        }

        // Named after what the client asked for, not the symlink target.
        let file_name = last_segment(&resolved.relative);
        Ok(ResolvedFile {
            mime_type: mime_for(Path::new(&file_name)),
            absolute_path: resolved.absolute,
            file_name,
            size: metadata.len(),
        })
    }

    /// Resolve a directory inside a shared folder for bulk download.
    pub fn resolve_directory(
        &self,
        entry_id: &str,
        subpath: &str,
    ) -> Result<ResolvedDirectory, FileError> {
        let entry = self.registry.get_directory(entry_id)?;
        let resolved = self.sandboxed(&entry.absolute_path, subpath)?;

        let metadata =
            fs::metadata(&resolved.absolute).map_err(|e| FileError::from_io(e, "path"))?;
        if !metadata.is_dir() {
            return Err(FileError::NotADirectory);
        }

        let name = if resolved.is_root() {
            entry.name
        } else {
            last_segment(&resolved.relative)
        };

        Ok(ResolvedDirectory {
            absolute_path: resolved.absolute,
            name,
            include_hidden: self.include_hidden,
        })
    }

    fn sandboxed(&self, root: &Path, subpath: &str) -> Result<SandboxedPath, FileError> {
        let resolved = sandbox::resolve(root, subpath)?;
        if !self.include_hidden && resolved.is_hidden() {
            return Err(FileError::NotFound("path".into()));
        }
        Ok(resolved)
    }
}

fn last_segment(relative: &str) -> String {
    relative.rsplit('/').next().unwrap_or(relative).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_structure(dir: &Path) {
        fs::create_dir_all(dir.join("docs/reports/2024")).unwrap();
        fs::write(dir.join("docs/index.html"), "<h1>Docs</h1>").unwrap();
        fs::write(dir.join("docs/reports/q1.pdf"), "%PDF-1.4").unwrap();
        fs::write(dir.join("report.pdf"), "%PDF-1.7 standalone").unwrap();
        fs::write(dir.join("secret.txt"), "secret").unwrap();
        fs::create_dir_all(dir.join("docs/.cache")).unwrap();
        fs::write(dir.join("docs/.env"), "TOKEN=1").unwrap();
    }

    struct Fixture {
        tmp: TempDir,
        resolver: ContentResolver,
        docs_id: String,
        file_id: String,
    }

    fn setup() -> Fixture {
        let tmp = TempDir::new().unwrap();
        create_test_structure(tmp.path());
        let registry = Arc::new(ShareRegistry::new());
        let docs_id = registry.add(tmp.path().join("docs")).unwrap().id;
        let file_id = registry.add(tmp.path().join("report.pdf")).unwrap().id;
        Fixture {
            tmp,
            resolver: ContentResolver::new(registry),
            docs_id,
            file_id,
        }
    }

    // ========================================================================
    // Standalone files
    // ========================================================================

    #[test]
    fn test_resolve_shared_file() {
        let f = setup();
        let resolved = f.resolver.resolve_file(&f.file_id).unwrap();

        let expected = fs::canonicalize(f.tmp.path().join("report.pdf")).unwrap();
        assert_eq!(resolved.absolute_path, expected);
        assert_eq!(resolved.mime_type, "application/pdf");
        assert_eq!(resolved.file_name, "report.pdf");
        assert_eq!(resolved.size, 19);
    }

    #[test]
    fn test_resolve_unknown_id() {
        let f = setup();
        assert!(matches!(
            f.resolver.resolve_file("nope"),
            Err(FileError::NotFound(_))
        ));
    }

    #[test]
    fn test_directory_entry_is_not_a_file() {
        let f = setup();
        assert!(matches!(
            f.resolver.resolve_file(&f.docs_id),
            Err(FileError::IsADirectory)
        ));
    }

    #[test]
    fn test_shared_file_moved_away() {
        let f = setup();
        fs::rename(
            f.tmp.path().join("report.pdf"),
            f.tmp.path().join("moved.pdf"),
        )
        .unwrap();
        assert!(matches!(
            f.resolver.resolve_file(&f.file_id),
            Err(FileError::NotFound(_))
        ));
    }

    // ========================================================================
    // Files inside shared folders
    // ========================================================================

    #[test]
    fn test_resolve_nested_file() {
        let f = setup();
        let resolved = f
            .resolver
            .resolve_folder_file(&f.docs_id, "reports/q1.pdf")
            .unwrap();

        let expected = fs::canonicalize(f.tmp.path().join("docs/reports/q1.pdf")).unwrap();
        assert_eq!(resolved.absolute_path, expected);
        assert_eq!(resolved.mime_type, "application/pdf");
        assert_eq!(resolved.file_name, "q1.pdf");
    }

    #[test]
    fn test_nested_mime_from_name() {
        let f = setup();
        let resolved = f.resolver.resolve_folder_file(&f.docs_id, "index.html").unwrap();
        assert_eq!(resolved.mime_type, "text/html");
    }

    #[test]
    fn test_nested_directory_rejected() {
        let f = setup();
        assert!(matches!(
            f.resolver.resolve_folder_file(&f.docs_id, "reports"),
            Err(FileError::IsADirectory)
        ));
    }

    #[test]
    fn test_nested_missing() {
        let f = setup();
        assert!(matches!(
            f.resolver.resolve_folder_file(&f.docs_id, "reports/q9.pdf"),
            Err(FileError::NotFound(_))
        ));
    }

    #[test]
    fn test_nested_traversal_denied() {
        let f = setup();
        assert!(matches!(
            f.resolver.resolve_folder_file(&f.docs_id, "../secret.txt"),
            Err(FileError::Denied)
        ));
    }

    #[test]
    fn test_subpath_on_file_entry() {
        let f = setup();
        assert!(matches!(
            f.resolver.resolve_folder_file(&f.file_id, "anything"),
            Err(FileError::NotADirectory)
        ));
    }

    #[test]
    fn test_folder_route_never_serves_file_entry() {
        let f = setup();
        assert!(matches!(
            f.resolver.resolve_folder_file(&f.file_id, ""),
            Err(FileError::NotADirectory)
        ));
        assert!(matches!(
            f.resolver.resolve_folder_file(&f.docs_id, ""),
            Err(FileError::IsADirectory)
        ));
        assert!(matches!(
            f.resolver.resolve_folder_file(&f.docs_id, "/"),
            Err(FileError::IsADirectory)
        ));
    }

    // ========================================================================
    // Hidden names
    // ========================================================================

    #[test]
    fn test_hidden_served_by_default() {
        let f = setup();
        let resolved = f.resolver.resolve_folder_file(&f.docs_id, ".env").unwrap();
        assert_eq!(resolved.file_name, ".env");
        assert!(f.resolver.resolve_directory(&f.docs_id, "").unwrap().include_hidden);
    }

    #[test]
    fn test_hidden_refused_when_disabled() {
        let f = setup();
        let registry = Arc::clone(&f.resolver.registry);
        let resolver = ContentResolver::new(registry).include_hidden(false);

        assert!(matches!(
            resolver.resolve_folder_file(&f.docs_id, ".env"),
            Err(FileError::NotFound(_))
        ));
        assert!(matches!(
            resolver.resolve_folder_file(&f.docs_id, "reports/../.env"),
            Err(FileError::NotFound(_))
        ));
        assert!(matches!(
            resolver.resolve_directory(&f.docs_id, ".cache"),
            Err(FileError::NotFound(_))
        ));

        let dir = resolver.resolve_directory(&f.docs_id, "").unwrap();
        assert!(!dir.include_hidden);
        assert!(resolver.resolve_folder_file(&f.docs_id, "index.html").is_ok());
    }

    // ========================================================================
    // Directories
    // ========================================================================

    #[test]
    fn test_resolve_directory_root() {
        let f = setup();
        let resolved = f.resolver.resolve_directory(&f.docs_id, "").unwrap();
        assert_eq!(resolved.name, "docs");
        assert_eq!(
            resolved.absolute_path,
            fs::canonicalize(f.tmp.path().join("docs")).unwrap()
        );
    }

    #[test]
    fn test_resolve_directory_nested() {
        let f = setup();
        let resolved = f
            .resolver
            .resolve_directory(&f.docs_id, "reports/2024")
            .unwrap();
        assert_eq!(resolved.name, "2024");
    }

    #[test]
    fn test_resolve_directory_errors() {
        let f = setup();
        assert!(matches!(
            f.resolver.resolve_directory(&f.docs_id, "index.html"),
            Err(FileError::NotADirectory)
        ));
        assert!(matches!(
            f.resolver.resolve_directory(&f.docs_id, "gone"),
            Err(FileError::NotFound(_))
        ));
        assert!(matches!(
            f.resolver.resolve_directory(&f.docs_id, "../"),
            Err(FileError::Denied)
        ));
        assert!(matches!(
            f.resolver.resolve_directory(&f.file_id, ""),
            Err(FileError::NotADirectory)
        ));
    }
}
