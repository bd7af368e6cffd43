//! # LanShare
//!
//! Share files and folders from this machine with any browser on the local
//! network.
//!
//! An operator registers host paths as *shares*. Clients list the shares,
//! browse shared folders and download files or whole folders as zip archives.
//! Every client-supplied subpath is resolved through a sandbox anchored at the
//! share's canonical root, so nothing outside a share is ever reachable.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       ShareServer                         │
//! ├───────────────────────────────────────────────────────────┤
//! │  axum router (http)                                       │
//! │    admin · public · discovery handlers  ──► ApiError      │
//! │                                                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  Directory   │  │   Content    │  │  Upload store   │  │
//! │  │  Browser     │  │   Resolver   │  │  Zip archiver   │  │
//! │  └──────┬───────┘  └──────┬───────┘  └─────────────────┘  │
//! │         └───── sandbox ───┘                               │
//! │                  │                                        │
//! │          ShareRegistry (id → canonical path)              │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lanshare::{Config, ShareServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let server = ShareServer::new(config);
//!     server.registry().add("/srv/media")?;
//!
//!     let listener = server.bind().await?;
//!     server.serve(listener).await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`files`]: Sandbox, share registry, listing, resolution, archives, uploads
//! - [`http`]: Routes, handlers and error mapping
//! - [`net`]: LAN address discovery
//! - [`server`]: Server lifecycle
//! - [`ui`]: QR codes and browser launch

pub mod config;
pub mod files;
pub mod http;
pub mod net;
pub mod server;
pub mod ui;

// Re-export protocol for convenience
pub use protocol;

pub use config::Config;
pub use files::{
    ContentResolver, DirectoryBrowser, DirectoryListing, FileError, ShareRegistry, SharedEntry,
    UploadStore,
};
pub use http::{router, AppState};
pub use server::{ServerState, ShareServer};
