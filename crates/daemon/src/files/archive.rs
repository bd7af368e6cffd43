//! Zip packaging of shared directories.
//!
//! The walk never follows symlinks, so an archive can only contain what is
//! physically below the resolved directory. Entries that cannot be read are
//! left out and counted.
//!
//! [`stream_zip`] sends each entry to its writer as soon as the entry is
//! complete, so a client starts receiving bytes long before the walk ends.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::SpooledTempFile;
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors that abort archive creation.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What ended up in an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub files: usize,
    pub directories: usize,
    /// Entries left out: unreadable, symlinks, or special files.
    pub skipped: usize,
}

/// An entry's compressed bytes stay in memory up to this size, then spill to disk.
const SPOOL_MEMORY_LIMIT: usize = 1024 * 1024;

/// Write `dir` as a zip archive into `writer`.
///
/// Entry names are relative to `dir`, `/`-separated and prefixed with
/// `prefix/` when `prefix` is non-empty. Without `include_hidden`, dot-names
/// below `dir` and everything under them are left out. Returns the writer
/// positioned at the end of the archive.
pub fn write_zip<W: Write + Seek>(
    dir: &Path,
    prefix: &str,
    include_hidden: bool,
    writer: W,
) -> Result<(W, ArchiveSummary), ArchiveError> {
    build_zip(ZipWriter::new(writer), dir, prefix, include_hidden)
}

/// Write `dir` as a zip archive into a forward-only `out`.
///
/// Same entries as [`write_zip`]. Only the entry currently being compressed
/// is held back; everything before it has already been written to `out`.
pub fn stream_zip<W: Write>(
    dir: &Path,
    prefix: &str,
    include_hidden: bool,
    out: W,
) -> Result<(W, ArchiveSummary), ArchiveError> {
    let mut zip = ZipWriter::new(CommitWriter::new(out));
    zip.set_flush_on_finish_file(true);
    let (mut sink, summary) = build_zip(zip, dir, prefix, include_hidden)?;
    sink.flush()?;
    Ok((sink.into_inner(), summary))
}

fn build_zip<W: Write + Seek>(
    mut zip: ZipWriter<W>,
    dir: &Path,
    prefix: &str,
    include_hidden: bool,
) -> Result<(W, ArchiveSummary), ArchiveError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dir_options = SimpleFileOptions::default().unix_permissions(0o755);
    let mut summary = ArchiveSummary::default();

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry while archiving: {}", e);
                summary.skipped += 1;
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(dir) else {
            summary.skipped += 1;
            continue;
        };
        let name = entry_name(prefix, relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if !name.is_empty() {
                zip.add_directory(name, dir_options)?;
                summary.directories += 1;
            }
        } else if file_type.is_file() {
            let mut file = match File::open(entry.path()) {
                Ok(f) => f,
                Err(e) => {
                    debug!(path = ?entry.path(), error = %e, "Skipping unreadable file while archiving");
                    summary.skipped += 1;
                    continue;
                }
            };
            let large = entry
                .metadata()
                .map(|m| m.len() >= u64::from(u32::MAX))
                .unwrap_or(false);
            zip.start_file(name, options.large_file(large))?;
            io::copy(&mut file, &mut zip)?;
            summary.files += 1;
        } else {
            summary.skipped += 1;
        }
    }

    let writer = zip.finish()?;
    Ok((writer, summary))
}

/// Adapts a forward-only writer to the `Write + Seek` that [`ZipWriter`] needs.
///
/// Writes land in a spooled buffer. `flush` hands the buffer to `out` and
/// empties it; the zip writer calls it once an entry's header is final.
/// Seeking behind what was already handed over is an error.
struct CommitWriter<W> {
    out: W,
    pending: SpooledTempFile,
    committed: u64,
}

impl<W: Write> CommitWriter<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            pending: SpooledTempFile::new(SPOOL_MEMORY_LIMIT),
            committed: 0,
        }
    }

    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Write for CommitWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let position = self.pending.stream_position()?;
        let len = self.pending.seek(SeekFrom::End(0))?;
        if position != len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "flush while positioned before the end of pending data",
            ));
        }

        self.pending.seek(SeekFrom::Start(0))?;
        let sent = io::copy(&mut self.pending, &mut self.out)?;
        self.out.flush()?;
        self.pending.set_len(0)?;
        self.pending.seek(SeekFrom::Start(0))?;
        self.committed += sent;
        Ok(())
    }
}

impl<W: Write> Seek for CommitWriter<W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let local = match pos {
            SeekFrom::Start(offset) => match offset.checked_sub(self.committed) {
                Some(local) => SeekFrom::Start(local),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "seek into data that was already sent",
                    ))
                }
            },
            other => other,
        };
        Ok(self.committed + self.pending.seek(local)?)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn entry_name(prefix: &str, relative: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !prefix.is_empty() {
        parts.push(prefix.to_string());
    }
    parts.extend(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}
