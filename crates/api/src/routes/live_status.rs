//! Live application status handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics;
use domain::models::{LiveAppResponse, LiveStatusQuery, LiveStatusReport};

/// Replaces the device's running set with the reported snapshot.
///
/// POST /api/v1/live-status
pub async fn post_live_status(
    State(state): State<AppState>,
    payload: Result<Json<LiveStatusReport>, JsonRejection>,
) -> Result<Json<Vec<LiveAppResponse>>, ApiError> {
    let Json(report) = payload?;
    let reported = report.apps.len();
    let running = state.service.post_live_status(report).await?;
    metrics::record_live_status_report(reported);
    Ok(Json(running))
}

/// GET /api/v1/live-status
pub async fn get_live_status(
    State(state): State<AppState>,
    query: Result<Query<LiveStatusQuery>, QueryRejection>,
) -> Result<Json<Vec<LiveAppResponse>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.service.get_live_status(query).await?))
}
