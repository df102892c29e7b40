//! Layered server configuration.
//!
//! Defaults, then an optional `plantwatch.toml`, then `PLANTWATCH_*`
//! environment variables (double underscore for nesting, e.g.
//! `PLANTWATCH_TELEMETRY__TOKEN`). Credentials only ever arrive
//! through the file or the environment.

use alerting::AlertConfig;
use auth::OperatorEntry;
use notifier::TwilioConfig;
use serde::Deserialize;
use telemetry::TelemetryConfig;
use watcher::WatcherConfig;

use crate::rate_limit::RateLimitConfig;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bind address for the HTTP server
    pub listen_addr: String,
    /// Origin allowed by CORS
    pub cors_origin: String,
    /// Daily production target for one machine (units/day)
    pub machine_daily_target: f64,
    /// Daily production target across the fleet (units/day)
    pub fleet_daily_target: f64,
    /// Session token lifetime (seconds)
    pub session_ttl_secs: i64,
    /// Permitted operators
    pub operators: Vec<OperatorEntry>,
    pub telemetry: TelemetryConfig,
    pub twilio: TwilioConfig,
    pub watcher: WatcherConfig,
    pub alerts: AlertConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            machine_daily_target: 2400.0,
            fleet_daily_target: 12000.0,
            session_ttl_secs: 3600,
            operators: Vec::new(),
            telemetry: TelemetryConfig::default(),
            twilio: TwilioConfig::default(),
            watcher: WatcherConfig::default(),
            alerts: AlertConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Load configuration from the standard sources.
pub fn load() -> Result<AppConfig, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name("plantwatch").required(false))
        .add_source(config::Environment::with_prefix("PLANTWATCH").separator("__"))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppConfig::default();
        assert_eq!(settings.listen_addr, "0.0.0.0:5000");
        assert_eq!(settings.machine_daily_target, 2400.0);
        assert_eq!(settings.fleet_daily_target, 12000.0);
        assert!(settings.operators.is_empty());
        assert!(!settings.twilio.is_configured());
    }

    #[test]
    fn test_hourly_targets_divide_evenly() {
        let settings = AppConfig::default();
        assert_eq!(settings.machine_daily_target / 24.0, 100.0);
        assert_eq!(settings.fleet_daily_target / 24.0, 500.0);
    }
}
