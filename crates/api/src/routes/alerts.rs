//! Alert routes: fired-alert history and acknowledgement.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, AppState};
use alerting::Severity;
use storage::AlertRecord;

/// Query parameters for the alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Filter by severity name
    pub severity: Option<String>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for the alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<AlertRecord>,
    pub count: usize,
    pub unacknowledged_count: usize,
}

/// Fired alerts, newest first.
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<AlertResponse>, ApiError> {
    let limit = params.limit.min(500);
    let severity = params.severity.as_deref().and_then(Severity::parse);
    let data = state.repository.alerts(severity, limit)?;
    Ok(Json(AlertResponse {
        count: data.len(),
        unacknowledged_count: state.repository.unacknowledged_count(),
        data,
    }))
}

/// Acknowledge one fired alert. Also clears the dedupe state for its
/// (machine, metric) key, so a still-exceeding reading can fire again
/// on the next poll.
pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<AlertRecord>, ApiError> {
    let record = state.repository.acknowledge_alert(id)?;
    {
        let mut manager = state.manager.lock().unwrap_or_else(|e| e.into_inner());
        manager.acknowledge(&record.key());
    }
    Ok(Json(record))
}
