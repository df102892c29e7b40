//! Operator login route.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::{ApiError, AppState};
use auth::Role;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// The role the operator is logging in as; must match the role
    /// their email is assigned to
    pub role: Role,
}

/// Successful login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    /// Dashboard path the client should redirect to
    pub redirect: String,
    pub expires_at: DateTime<Utc>,
}

/// Check the operator directory and issue a session token. Failures
/// come back as 401 with the first failing check's message: unknown
/// email, then role mismatch, then wrong password.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let entry = state
        .directory
        .login(&request.email, &request.password, request.role)?;
    let session = state.sessions.issue(&entry.email, entry.role);
    info!(email = %entry.email, role = %entry.role, "operator logged in");
    Ok(Json(LoginResponse {
        token: session.token,
        role: session.role,
        redirect: session.role.dashboard_path(),
        expires_at: session.expires_at,
    }))
}
