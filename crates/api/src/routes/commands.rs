//! Control command handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;

use super::SuccessResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics;
use domain::models::{
    CommandAction, CommandHistoryQuery, CommandHistoryResponse, IdentityHints,
    IssueCommandRequest, PendingCommand,
};

/// Identity hints an agent sends when polling.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuery {
    pub device_uuid: Option<String>,
    pub device_id: Option<i64>,
    pub mac_address: Option<String>,
    pub machine_name: Option<String>,
}

impl PendingQuery {
    fn hints(&self) -> IdentityHints {
        IdentityHints::new(
            self.device_uuid.as_deref(),
            self.device_id,
            self.mac_address.as_deref(),
            self.machine_name.as_deref(),
        )
    }
}

async fn issue(
    state: AppState,
    action: CommandAction,
    payload: Result<Json<IssueCommandRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = payload?;
    state.service.issue_command(action, request).await?;
    metrics::record_command_issued(action);
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/v1/commands/kill
pub async fn issue_kill(
    State(state): State<AppState>,
    payload: Result<Json<IssueCommandRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    issue(state, CommandAction::Kill, payload).await
}

/// POST /api/v1/commands/relaunch
pub async fn issue_relaunch(
    State(state): State<AppState>,
    payload: Result<Json<IssueCommandRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    issue(state, CommandAction::Relaunch, payload).await
}

/// POST /api/v1/commands/schedule
pub async fn issue_schedule(
    State(state): State<AppState>,
    payload: Result<Json<IssueCommandRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    issue(state, CommandAction::Schedule, payload).await
}

/// Active commands for the polling agent. One-shot commands are consumed.
///
/// GET /api/v1/commands/pending
pub async fn poll_pending(
    State(state): State<AppState>,
    query: Result<Query<PendingQuery>, QueryRejection>,
) -> Result<Json<Vec<PendingCommand>>, ApiError> {
    let Query(query) = query?;
    let pending = state.service.poll_pending(query.hints()).await?;
    metrics::record_commands_delivered(pending.len());
    Ok(Json(pending))
}

/// POST /api/v1/commands/ack/:id
pub async fn ack_command(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Path(id) = id?;
    state.service.ack_command(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/v1/commands/history
pub async fn command_history(
    State(state): State<AppState>,
    query: Result<Query<CommandHistoryQuery>, QueryRejection>,
) -> Result<Json<CommandHistoryResponse>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.service.command_history(query).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_query_drops_blank_hints() {
        let query = PendingQuery {
            device_uuid: Some("  ".into()),
            machine_name: Some("LAB-07".into()),
            ..Default::default()
        };
        let hints = query.hints();
        assert!(hints.device_uuid.is_none());
        assert_eq!(hints.machine_name.as_deref(), Some("LAB-07"));
    }
}
