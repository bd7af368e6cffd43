//! Discovery handlers: how clients find this server.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use protocol::{IpInfo, QrCodeResponse};

use super::{ApiError, AppState};
use crate::net;
use crate::ui::qr;

pub(super) async fn ip_info(State(state): State<Arc<AppState>>) -> Json<IpInfo> {
    Json(IpInfo {
        ips: net::local_ipv4_addrs()
            .into_iter()
            .map(|ip| ip.to_string())
            .collect(),
        port: state.port,
    })
}

pub(super) async fn qr_code(
    State(state): State<Arc<AppState>>,
) -> Result<Json<QrCodeResponse>, ApiError> {
    let url = net::share_url(state.port);
    let data_url = qr::png_data_url(&url).map_err(|e| {
        tracing::error!("QR generation failed: {}", e);
        ApiError::new(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate QR",
        )
    })?;
    Ok(Json(QrCodeResponse { qr: data_url, url }))
}
