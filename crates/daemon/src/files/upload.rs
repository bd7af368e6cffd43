//! Storage of files pushed by clients.
//!
//! Each upload is written to a hidden temp file inside the upload directory
//! and moved to its final name only once complete. An upload that is dropped
//! before [`PendingUpload::finish`] leaves nothing behind.
//!
//! Every method here touches the disk. Async callers hand the store and the
//! pending upload to the blocking pool.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Highest collision suffix tried before giving up.
const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Uploads are switched off in the configuration.
    #[error("uploads are disabled")]
    Disabled,

    /// The client-supplied file name is unusable.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    /// The upload exceeded the configured size limit.
    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// No free destination name was found.
    #[error("too many files named {0:?}")]
    NameExhausted(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Writes uploads into a single directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_size: u64,
    enabled: bool,
}

impl UploadStore {
    /// Create a store writing into `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            dir: dir.into(),
            max_size,
            enabled: true,
        }
    }

    /// Enable or disable uploads.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Start an upload for a client-supplied file name.
    pub fn begin(&self, client_name: &str) -> Result<PendingUpload, UploadError> {
        if !self.enabled {
            return Err(UploadError::Disabled);
        }
        let name = sanitize_file_name(client_name)?;

        fs::create_dir_all(&self.dir)?;
        let temp = tempfile::Builder::new()
            .prefix(".lanshare-upload-")
            .suffix(".part")
            .tempfile_in(&self.dir)?;

        debug!(name = %name, temp = ?temp.path(), "Upload started");
        Ok(PendingUpload {
            dir: self.dir.clone(),
            name,
            temp,
            written: 0,
            limit: self.max_size,
        })
    }
}

/// An upload in progress. Dropping it discards the partial data.
#[derive(Debug)]
pub struct PendingUpload {
    dir: PathBuf,
    name: String,
    temp: NamedTempFile,
    written: u64,
    limit: u64,
}

impl PendingUpload {
    /// Sanitized name the upload will be stored under, before collision handling.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append a chunk, failing once the size limit would be exceeded.
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<(), UploadError> {
        let size = self.written + data.len() as u64;
        if size > self.limit {
            return Err(UploadError::FileTooLarge {
                size,
                limit: self.limit,
            });
        }
        self.temp.write_all(data)?;
        self.written = size;
        Ok(())
    }

    /// Move the data to its final name and return that name.
    ///
    /// An existing file is never overwritten: `name.ext` becomes
    /// `name (1).ext`, `name (2).ext` and so on.
    pub fn finish(self) -> Result<String, UploadError> {
        let PendingUpload {
            dir,
            name,
            mut temp,
            written,
            ..
        } = self;
        temp.flush()?;

        for n in 0..=MAX_COLLISION_SUFFIX {
            let candidate = numbered_name(&name, n);
            match temp.persist_noclobber(dir.join(&candidate)) {
                Ok(_) => {
                    info!(name = %candidate, bytes = written, "Upload stored");
                    return Ok(candidate);
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => temp = e.file,
                Err(e) => return Err(UploadError::Io(e.error)),
            }
        }

        Err(UploadError::NameExhausted(name))
    }
}

/// Reduce a client-supplied name to a safe single path component.
///
/// Directory parts (either separator) are dropped. Empty names, `.`, `..`
/// and names carrying control characters are rejected.
pub fn sanitize_file_name(client_name: &str) -> Result<String, UploadError> {
    let name = client_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.chars().any(char::is_control) {
        return Err(UploadError::InvalidName(client_name.to_string()));
    }
    Ok(name.to_string())
}

/// `report.pdf` with n=2 is `report (2).pdf`. n=0 is the name unchanged.
fn numbered_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    match path.extension() {
        Some(ext) => format!("{} ({}).{}", stem, n, ext.to_string_lossy()),
        None => format!("{} ({})", stem, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn assert_send<T: Send + 'static>() {}

    #[test]
    fn test_pending_upload_moves_across_threads() {
        assert_send::<UploadStore>();
        assert_send::<PendingUpload>();

        let temp_dir = TempDir::new().unwrap();
        let store = UploadStore::new(temp_dir.path().join("in"), 1024);
        let mut pending = store.begin("moved.txt").unwrap();
        pending = std::thread::spawn(move || {
            pending.write_chunk(b"from another thread").unwrap();
            pending
        })
        .join()
        .unwrap();
        assert_eq!(pending.finish().unwrap(), "moved.txt");
    }

    fn visible_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_file_name("photo.jpg").unwrap(), "photo.jpg");
        assert_eq!(sanitize_file_name("  spaced.txt ").unwrap(), "spaced.txt");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\a.txt").unwrap(), "a.txt");
    }

    #[test]
    fn test_sanitize_rejects_bad_names() {
        for bad in ["", "   ", ".", "..", "dir/", "a/..", "bad\0name", "line\nbreak"] {
            assert!(
                matches!(sanitize_file_name(bad), Err(UploadError::InvalidName(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("report.pdf", 0), "report.pdf");
        assert_eq!(numbered_name("report.pdf", 2), "report (2).pdf");
        assert_eq!(numbered_name("archive.tar.gz", 1), "archive.tar (1).gz");
        assert_eq!(numbered_name("README", 1), "README (1)");
    }

    #[test]
    fn test_upload_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = UploadStore::new(temp_dir.path().join("inbox"), 1024);

        let mut upload = store.begin("notes.txt").unwrap();
        upload.write_chunk(b"Hello, ").unwrap();
        upload.write_chunk(b"World!").unwrap();
        assert_eq!(upload.written(), 13);
        let stored = upload.finish().unwrap();

        assert_eq!(stored, "notes.txt");
        let content = fs::read(temp_dir.path().join("inbox/notes.txt")).unwrap();
        assert_eq!(content, b"Hello, World!");
        assert_eq!(visible_files(&temp_dir.path().join("inbox")), vec!["notes.txt"]);
    }

    #[test]
    fn test_upload_name_collision() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "original").unwrap();
        let store = UploadStore::new(temp_dir.path(), 1024);

        let mut first = store.begin("notes.txt").unwrap();
        first.write_chunk(b"one").unwrap();
        assert_eq!(first.finish().unwrap(), "notes (1).txt");

        let mut second = store.begin("notes.txt").unwrap();
        second.write_chunk(b"two").unwrap();
        assert_eq!(second.finish().unwrap(), "notes (2).txt");

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("notes.txt")).unwrap(),
            "original"
        );
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("notes (2).txt")).unwrap(),
            "two"
        );
    }

    #[test]
    fn test_upload_file_too_large() {
        let temp_dir = TempDir::new().unwrap();
        let store = UploadStore::new(temp_dir.path(), 8);

        let mut upload = store.begin("big.bin").unwrap();
        upload.write_chunk(b"12345").unwrap();
        let result = upload.write_chunk(b"6789");
        assert!(matches!(
            result,
            Err(UploadError::FileTooLarge { size: 9, limit: 8 })
        ));

        drop(upload);
        assert!(visible_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_upload_exactly_at_limit() {
        let temp_dir = TempDir::new().unwrap();
        let store = UploadStore::new(temp_dir.path(), 4);

        let mut upload = store.begin("four.bin").unwrap();
        upload.write_chunk(b"1234").unwrap();
        assert_eq!(upload.finish().unwrap(), "four.bin");
    }

    #[test]
    fn test_abandoned_upload_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = UploadStore::new(temp_dir.path(), 1024);

        let mut upload = store.begin("partial.txt").unwrap();
        upload.write_chunk(b"half").unwrap();
        drop(upload);

        assert!(visible_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_uploads_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let store = UploadStore::new(temp_dir.path(), 1024).enabled(false);

        assert!(!store.is_enabled());
        assert!(matches!(store.begin("a.txt"), Err(UploadError::Disabled)));
    }

    #[test]
    fn test_traversal_name_stays_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        let inbox = temp_dir.path().join("inbox");
        let store = UploadStore::new(&inbox, 1024);

        let mut upload = store.begin("../escape.txt").unwrap();
        upload.write_chunk(b"x").unwrap();
        assert_eq!(upload.finish().unwrap(), "escape.txt");

        assert!(inbox.join("escape.txt").exists());
        assert!(!temp_dir.path().join("escape.txt").exists());
    }
}
