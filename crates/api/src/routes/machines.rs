//! Machine routes: fleet snapshots and per-machine history.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::{ApiError, AppState};
use telemetry::{DataSource, MachineHistory, MachineSnapshot, TelemetryError};

/// Response for the machines endpoint
#[derive(Debug, Serialize)]
pub struct MachinesResponse {
    pub data: Vec<MachineSnapshot>,
    pub count: usize,
    pub source: DataSource,
}

/// Latest snapshot per machine.
///
/// Never fails: a live query is tried first, then the watcher's cached
/// snapshots, then generated sample rows. The `source` field says
/// which one the caller got.
pub async fn get_machines(State(state): State<Arc<AppState>>) -> Json<MachinesResponse> {
    match state.telemetry.machines().await {
        Ok(data) => {
            if let Err(e) = state.repository.store_snapshots(data.clone()) {
                warn!(error = %e, "failed to cache snapshots");
            }
            Json(respond(data, DataSource::Influxdb))
        }
        Err(e) => {
            warn!(error = %e, "machine query failed, falling back");
            match state.repository.snapshots() {
                Ok(cached) if !cached.is_empty() => Json(respond(cached, DataSource::Cache)),
                _ => Json(respond(fallback::sample_machines(), DataSource::Fallback)),
            }
        }
    }
}

fn respond(data: Vec<MachineSnapshot>, source: DataSource) -> MachinesResponse {
    MachinesResponse {
        count: data.len(),
        data,
        source,
    }
}

/// Temperature and pressure history for one machine. 404 when the
/// store has no rows for the id.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MachineHistory>, ApiError> {
    match state.telemetry.history(&id).await {
        Ok(history) => Ok(Json(history)),
        Err(TelemetryError::NoData) => Err(ApiError::NotFound(format!(
            "no historical data for machine {}",
            id
        ))),
        Err(e) => Err(e.into()),
    }
}
