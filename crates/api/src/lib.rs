//! Plant Monitoring API Server
//!
//! REST gateway for the monitoring dashboard: proxies time-series
//! queries to the hosted telemetry store, forwards SMS/voice alerts
//! through the notifier, and gates everything behind the operator
//! login.

use axum::{
    extract::State,
    http::HeaderValue,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod error;
mod rate_limit;
mod routes;

pub use error::ApiError;
pub use rate_limit::RateLimitConfig;

use alerting::AlertManager;
use auth::{OperatorDirectory, SessionStore};
use notifier::TwilioClient;
use storage::Repository;
use telemetry::TelemetryClient;
use watcher::Watcher;

/// Application state shared across handlers
pub struct AppState {
    pub repository: Arc<Repository>,
    pub telemetry: Arc<TelemetryClient>,
    pub notifier: Option<Arc<TwilioClient>>,
    pub manager: Arc<Mutex<AlertManager>>,
    pub directory: OperatorDirectory,
    pub sessions: SessionStore,
    /// Daily production target for a single machine
    pub machine_daily_target: f64,
    /// Daily production target across the fleet
    pub fleet_daily_target: f64,
    pub version: String,
    pub start_time: std::time::Instant,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    pub metrics: SystemMetrics,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub telemetry: ComponentHealth,
    pub notifier: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub last_activity_ms: Option<i64>,
}

/// System metrics
#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub machine_count: usize,
    pub log_count: usize,
    pub alert_count: usize,
    pub unacknowledged_alerts: usize,
    pub live_sessions: usize,
}

/// Create the application router. Dispatch and login sit behind the
/// rate limiter; everything else is read-mostly and unthrottled.
pub fn create_router(state: Arc<AppState>, settings: &config::AppConfig) -> Router {
    let governed = Router::new()
        .route("/api/v1/dispatch", post(routes::dispatch::send_alert))
        .route("/api/v1/login", post(routes::login::login))
        .layer(rate_limit::governor_layer(&settings.rate_limit));

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/machines", get(routes::machines::get_machines))
        .route("/api/v1/machines/:id/history", get(routes::machines::get_history))
        .route("/api/v1/production/:id", get(routes::production::get_production))
        .route("/api/v1/logs", get(routes::logs::get_logs))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/:id/ack", post(routes::alerts::acknowledge))
        .merge(governed)
        .layer(cors_layer(&settings.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!(origin, "invalid CORS origin, allowing any");
            layer.allow_origin(Any)
        }
    }
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let last_update_ms = state
        .repository
        .snapshots()
        .ok()
        .and_then(|all| all.iter().map(|s| s.last_update).max())
        .map(|t| (chrono::Utc::now() - t).num_milliseconds());

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            telemetry: ComponentHealth {
                status: if state.repository.snapshot_count() > 0 {
                    "ok".to_string()
                } else {
                    "no-data".to_string()
                },
                last_activity_ms: last_update_ms,
            },
            notifier: ComponentHealth {
                status: if state.notifier.is_some() {
                    "ok".to_string()
                } else {
                    "disabled".to_string()
                },
                last_activity_ms: None,
            },
        },
        metrics: SystemMetrics {
            machine_count: state.repository.snapshot_count(),
            log_count: state.repository.log_count(),
            alert_count: state.repository.alert_count(),
            unacknowledged_alerts: state.repository.unacknowledged_count(),
            live_sessions: state.sessions.live_count(),
        },
    };

    Json(response)
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Build state, spawn the watcher, and serve until shutdown.
pub async fn run_server(settings: config::AppConfig) -> anyhow::Result<()> {
    let telemetry = Arc::new(TelemetryClient::new(settings.telemetry.clone())?);
    let notifier = if settings.twilio.is_configured() {
        Some(Arc::new(TwilioClient::new(settings.twilio.clone())?))
    } else {
        info!("notifier not configured; alerts will be recorded but not delivered");
        None
    };
    let repository = Arc::new(Repository::default());
    let manager = Arc::new(Mutex::new(AlertManager::new(settings.alerts.clone())));
    let directory = OperatorDirectory::from_entries(settings.operators.clone());
    if directory.is_empty() {
        warn!("no operators configured; all logins will be rejected");
    }

    let state = Arc::new(AppState {
        repository: repository.clone(),
        telemetry: telemetry.clone(),
        notifier: notifier.clone(),
        manager: manager.clone(),
        directory,
        sessions: SessionStore::new(settings.session_ttl_secs),
        machine_daily_target: settings.machine_daily_target,
        fleet_daily_target: settings.fleet_daily_target,
        version: env!("CARGO_PKG_VERSION").to_string(),
        start_time: std::time::Instant::now(),
    });

    let poller = Arc::new(Watcher::new(
        settings.watcher.clone(),
        telemetry,
        repository,
        manager,
        notifier,
    ));
    tokio::spawn(poller.run());

    let app = create_router(state, &settings);
    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
    info!("API server listening on {}", settings.listen_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let settings = config::AppConfig::default();
        Arc::new(AppState {
            repository: Arc::new(Repository::default()),
            telemetry: Arc::new(TelemetryClient::new(settings.telemetry.clone()).unwrap()),
            notifier: None,
            manager: Arc::new(Mutex::new(AlertManager::default())),
            directory: OperatorDirectory::from_entries(Vec::new()),
            sessions: SessionStore::new(settings.session_ttl_secs),
            machine_daily_target: settings.machine_daily_target,
            fleet_daily_target: settings.fleet_daily_target,
            version: "test".to_string(),
            start_time: std::time::Instant::now(),
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(test_state(), &config::AppConfig::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_alerts_endpoint_empty() {
        let app = create_router(test_state(), &config::AppConfig::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/alerts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
