//! Event log route.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;
use telemetry::{DataSource, EventLog};

/// Query parameters for the logs endpoint
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    25
}

/// Response for the logs endpoint
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub data: Vec<EventLog>,
    pub count: usize,
    pub source: DataSource,
}

/// Recent event log entries, newest first. On a failed query the
/// watcher's cached entries are served instead; an empty list is a
/// valid answer, never an error.
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogQuery>,
) -> Json<LogsResponse> {
    let limit = params.limit.min(100);
    match state.telemetry.logs(limit).await {
        Ok(data) => Json(LogsResponse {
            count: data.len(),
            data,
            source: DataSource::Influxdb,
        }),
        Err(e) => {
            warn!(error = %e, "log query failed, serving cached entries");
            let data = state.repository.logs(limit).unwrap_or_default();
            Json(LogsResponse {
                count: data.len(),
                data,
                source: DataSource::Cache,
            })
        }
    }
}
