//! Refresh handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::refresh::RefreshSummary;
use crate::{AppError, AppState};

/// Response for refresh status
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatusResponse {
    pub last_refresh: DateTime<Utc>,
    pub next_refresh: Option<DateTime<Utc>>,
    /// Milliseconds until the next scheduled refresh
    pub time_until_next_refresh: i64,
}

/// GET /api/refresh/status - When data was last and will next be refreshed
pub async fn get_refresh_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshStatusResponse>, AppError> {
    let status = state
        .refresher
        .status()
        .ok_or_else(|| AppError::not_found("No refresh has completed yet"))?;

    Ok(Json(RefreshStatusResponse {
        last_refresh: status.last_refresh,
        next_refresh: status.next_refresh,
        time_until_next_refresh: status.millis_until_next(Utc::now()),
    }))
}

/// POST /api/refresh - Reload the source now
pub async fn trigger_refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshSummary>, AppError> {
    if state.refresher.source().is_none() {
        return Err(AppError::bad_request("No data source configured"));
    }

    info!("Manual refresh requested");
    let summary = state.refresher.refresh().await?;
    Ok(Json(summary))
}
