//! Report handlers
//!
//! Read-only views of the most recently published report.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use cadence_core::{AnalyticsReport, EntityStats, Insight};

use crate::{AppError, AppState};

/// Message returned before the first successful refresh
pub const NO_DATA: &str = "No data available";

/// Query parameters for listing insights
#[derive(Debug, Deserialize)]
pub struct InsightQuery {
    /// Return at most this many insights, in order
    pub limit: Option<usize>,
}

fn current_report(state: &AppState) -> Result<Arc<AnalyticsReport>, AppError> {
    state
        .refresher
        .store()
        .get()
        .ok_or_else(|| AppError::not_found(NO_DATA))
}

/// GET /api/data - The full report
pub async fn get_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Arc<AnalyticsReport>>, AppError> {
    Ok(Json(current_report(&state)?))
}

/// GET /api/insights - The ordered insight list
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InsightQuery>,
) -> Result<Json<Vec<Insight>>, AppError> {
    let report = current_report(&state)?;
    let limit = params.limit.unwrap_or(report.insights.len());
    Ok(Json(report.insights.iter().take(limit).cloned().collect()))
}

/// GET /api/stats - Per-entity statistics
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EntityStats>, AppError> {
    let report = current_report(&state)?;
    Ok(Json(report.stats.clone()))
}
