//! Admin handlers: managing shares and picking host paths.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use protocol::{AdminStatus, BrowseEntry, BrowseRequest, RemoveResponse, ShareRequest, ShareResponse};
use tracing::debug;

use super::{run_blocking, ApiError, AppState};
use crate::files::host;

pub(super) async fn add_share(
    State(state): State<Arc<AppState>>,
    request: Result<Json<ShareRequest>, JsonRejection>,
) -> Result<Json<ShareResponse>, ApiError> {
    let Json(request) = request.map_err(|e| {
        debug!("Rejected share request: {}", e);
        ApiError::bad_request("Invalid path")
    })?;

    let outcome = run_blocking(move || Ok(state.registry.add(&request.target_path)?)).await?;

    Ok(Json(ShareResponse {
        success: true,
        count: outcome.count,
        id: Some(outcome.id),
        created: Some(outcome.created),
        message: (!outcome.created).then(|| "Already shared".to_string()),
    }))
}

pub(super) async fn remove_share(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RemoveResponse>, ApiError> {
    state.registry.remove(&id)?;
    Ok(Json(RemoveResponse { success: true }))
}

pub(super) async fn browse_host(
    request: Result<Json<BrowseRequest>, JsonRejection>,
) -> Result<Json<Vec<BrowseEntry>>, ApiError> {
    let path = request
        .ok()
        .and_then(|Json(r)| r.path)
        .ok_or_else(|| ApiError::bad_request("Invalid path"))?;

    let entries = run_blocking(move || Ok(host::browse(&path)?)).await?;
    Ok(Json(entries))
}

pub(super) async fn drives() -> Json<Vec<String>> {
    Json(host::drives())
}

pub(super) async fn is_admin() -> Json<AdminStatus> {
    Json(AdminStatus { is_admin: true })
}
