//! HTTP surface of the LanShare server.
//!
//! ## Routes
//!
//! Admin:
//! - `POST   /api/share`            share a host file or directory
//! - `DELETE /api/share/{id}`       stop sharing
//! - `POST   /api/system/browse`    list a host directory (path picker)
//! - `GET    /api/system/drives`    filesystem roots
//! - `GET    /api/is-admin`
//!
//! Public:
//! - `GET  /api/files`                          root shares
//! - `GET  /api/folder/{id}?path=`              folder listing
//! - `GET  /api/download/{id}`                  shared file
//! - `GET  /api/folder/{id}/download?path=`     file inside a shared folder
//! - `GET  /api/folder/{id}/download-zip?path=` directory as zip
//! - `POST /api/upload`                         multipart, field `files`
//! - `GET  /api/ip`, `GET /api/qrcode`          discovery
//!
//! Anything else falls through to the static UI when one is configured.

mod admin;
mod discovery;
pub mod error;
mod public;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::files::{ContentResolver, DirectoryBrowser, ShareRegistry, UploadStore};

pub use error::ApiError;

/// Everything a request handler needs. Built once per server.
pub struct AppState {
    pub registry: Arc<ShareRegistry>,
    pub browser: DirectoryBrowser,
    pub resolver: ContentResolver,
    pub uploads: UploadStore,
    /// Port advertised in discovery responses.
    pub port: u16,
}

impl AppState {
    /// Wire the services around `registry` according to `config`.
    pub fn new(config: &Config, registry: Arc<ShareRegistry>) -> Self {
        Self {
            browser: DirectoryBrowser::new(Arc::clone(&registry))
                .include_hidden(config.share.show_hidden),
            resolver: ContentResolver::new(Arc::clone(&registry))
                .include_hidden(config.share.show_hidden),
            uploads: UploadStore::new(config.upload.dir.clone(), config.upload.max_size)
                .enabled(config.upload.enabled),
            port: config.server.port,
            registry,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>, public_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        // Admin
        .route("/api/share", post(admin::add_share))
        .route("/api/share/{id}", delete(admin::remove_share))
        .route("/api/system/browse", post(admin::browse_host))
        .route("/api/system/drives", get(admin::drives))
        .route("/api/is-admin", get(admin::is_admin))
        // Public
        .route("/api/files", get(public::list_root))
        .route("/api/folder/{id}", get(public::list_folder))
        .route("/api/download/{id}", get(public::download_shared_file))
        .route("/api/folder/{id}/download", get(public::download_folder_file))
        .route("/api/folder/{id}/download-zip", get(public::download_folder_zip))
        .route(
            "/api/upload",
            post(public::upload).layer(DefaultBodyLimit::disable()),
        )
        // Discovery
        .route("/api/ip", get(discovery::ip_info))
        .route("/api/qrcode", get(discovery::qr_code))
        .with_state(state);

    let app = match public_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(TraceLayer::new_for_http())
}

/// Run blocking filesystem work off the async runtime.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("blocking task failed: {}", e)))?
}
