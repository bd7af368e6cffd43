//! Shared content: what is shared, and how requests reach it.
//!
//! - [`registry`] holds the top-level shared entries
//! - [`sandbox`] keeps client subpaths inside a shared root
//! - [`browser`] lists directories inside shared folders
//! - [`resolver`] turns download requests into files and directories
//! - [`archive`] packs a directory into a zip
//! - [`upload`] stores files pushed by clients
//!
//! # Security
//!
//! Every request carrying a subpath passes through [`sandbox::resolve`]
//! before the filesystem is touched. Containment is checked per path
//! segment after symlinks are resolved.

pub mod archive;
pub mod browser;
pub mod entry;
pub mod error;
pub mod host;
pub mod registry;
pub mod resolver;
pub mod sandbox;
pub mod upload;

pub use archive::{stream_zip, write_zip, ArchiveError, ArchiveSummary};
pub use browser::{DirectoryBrowser, DirectoryListing, ListedChild};
pub use entry::{EntryKind, SharedEntry};
pub use error::FileError;
pub use registry::{AddOutcome, ShareRegistry};
pub use resolver::{ContentResolver, ResolvedDirectory, ResolvedFile};
pub use sandbox::SandboxedPath;
pub use upload::{PendingUpload, UploadError, UploadStore};
