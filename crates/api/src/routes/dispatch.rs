//! Manual alert dispatch route.

use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::info;

use crate::{ApiError, AppState};
use notifier::{DispatchOutcome, DispatchRequest};

/// Send an SMS and/or place a call to the given number. Returns the
/// provider SIDs of whatever was sent.
pub async fn send_alert(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<DispatchOutcome>, ApiError> {
    let client = state.notifier.as_ref().ok_or(ApiError::NotifierUnavailable)?;
    info!(sms = request.sms, call = request.call, "dispatch requested");
    let outcome = client.dispatch(&request).await?;
    Ok(Json(outcome))
}
