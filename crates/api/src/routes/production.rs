//! Production aggregates route.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::{ApiError, AppState};
use telemetry::{ProductionSlot, TelemetryError};

/// Response for the production endpoint
#[derive(Debug, Serialize)]
pub struct ProductionResponse {
    pub data: Vec<ProductionSlot>,
    pub count: usize,
}

/// Hourly production over the trailing day. `all` aggregates the whole
/// fleet against the fleet target; any other id is a single machine.
pub async fn get_production(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductionResponse>, ApiError> {
    let fleet_wide = id == "all";
    let machine_id = if fleet_wide { None } else { Some(id.as_str()) };
    let daily_target = if fleet_wide {
        state.fleet_daily_target
    } else {
        state.machine_daily_target
    };

    match state.telemetry.production(machine_id, daily_target / 24.0).await {
        Ok(data) => Ok(Json(ProductionResponse {
            count: data.len(),
            data,
        })),
        Err(TelemetryError::NoData) => {
            Err(ApiError::NotFound("no production data available".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
