//! Alert manager implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use telemetry::MachineSnapshot;
use tracing::{debug, info, warn};

/// Which monitored metric exceeded its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Temperature,
    Pressure,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far past the threshold the reading is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Map the value/threshold ratio to a severity band.
    pub fn from_ratio(value: f64, threshold: f64) -> Self {
        if threshold <= 0.0 {
            return Self::Critical;
        }
        let ratio = value / threshold;
        if ratio >= 1.25 {
            Self::Critical
        } else if ratio >= 1.10 {
            Self::High
        } else {
            Self::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// One threshold violation observed on a poll
#[derive(Debug, Clone, Serialize)]
pub struct Exceedance {
    pub machine_id: String,
    pub machine_name: String,
    pub metric: Metric,
    pub value: f64,
    pub threshold: f64,
}

impl Exceedance {
    /// Deduplication key: one cooldown window per machine and metric.
    pub fn key(&self) -> String {
        format!("{}/{}", self.machine_id, self.metric)
    }

    pub fn severity(&self) -> Severity {
        Severity::from_ratio(self.value, self.threshold)
    }

    /// The message sent over SMS and shown in the alert feed.
    pub fn message(&self) -> String {
        format!(
            "ALERT: {} ({}) - {} THRESHOLD EXCEEDED! Current: {:.2}, Threshold: {}",
            self.machine_name,
            self.machine_id,
            self.metric.as_str().to_uppercase(),
            self.value,
            self.threshold,
        )
    }
}

/// Compare a snapshot's latest readings against its thresholds.
pub fn evaluate(snapshot: &MachineSnapshot) -> Vec<Exceedance> {
    let mut exceedances = Vec::new();
    let checks = [
        (Metric::Temperature, snapshot.temperature, snapshot.temp_threshold),
        (Metric::Pressure, snapshot.pressure, snapshot.pressure_threshold),
    ];
    for (metric, value, threshold) in checks {
        // Threshold zero means the field was absent upstream; skip it.
        if threshold > 0.0 && value > threshold {
            exceedances.push(Exceedance {
                machine_id: snapshot.id.clone(),
                machine_name: snapshot.name.clone(),
                metric,
                value,
                threshold,
            });
        }
    }
    exceedances
}

/// Dedupe and throttle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Cooldown between repeated alerts for the same machine and metric (seconds)
    pub cooldown_seconds: u64,
    /// Maximum alerts per hour across all machines before throttling
    pub max_alerts_per_hour: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 300,
            max_alerts_per_hour: 10,
        }
    }
}

#[derive(Debug, Clone)]
struct AlertState {
    last_fired: Instant,
    fire_count: usize,
}

/// Deduplication and throttling for the alert path
pub struct AlertManager {
    config: AlertConfig,
    states: HashMap<String, AlertState>,
    hourly_count: usize,
    hour_start: Instant,
}

impl AlertManager {
    pub fn new(config: AlertConfig) -> Self {
        info!(?config, "creating alert manager");
        Self {
            config,
            states: HashMap::new(),
            hourly_count: 0,
            hour_start: Instant::now(),
        }
    }

    /// Whether an exceedance with this dedupe key may fire now.
    pub fn should_fire(&mut self, key: &str) -> bool {
        self.should_fire_at(key, Instant::now())
    }

    fn should_fire_at(&mut self, key: &str, now: Instant) -> bool {
        if now.duration_since(self.hour_start) > Duration::from_secs(3600) {
            self.hourly_count = 0;
            self.hour_start = now;
        }

        if self.hourly_count >= self.config.max_alerts_per_hour {
            warn!(key, "alert throttled: hourly cap reached");
            return false;
        }

        if let Some(state) = self.states.get(key) {
            let cooldown = Duration::from_secs(self.config.cooldown_seconds);
            if now.duration_since(state.last_fired) < cooldown {
                debug!(key, "alert suppressed: in cooldown");
                return false;
            }
        }

        true
    }

    /// Record that an alert fired for this key.
    pub fn record_fire(&mut self, key: &str) {
        self.hourly_count += 1;
        let state = self.states.entry(key.to_string()).or_insert(AlertState {
            last_fired: Instant::now(),
            fire_count: 0,
        });
        state.last_fired = Instant::now();
        state.fire_count += 1;
        info!(key, count = state.fire_count, "alert recorded");
    }

    /// Acknowledge a key, clearing its cooldown so a persisting
    /// exceedance can fire again immediately.
    pub fn acknowledge(&mut self, key: &str) -> bool {
        let known = self.states.remove(key).is_some();
        if known {
            info!(key, "alert acknowledged");
        }
        known
    }

    pub fn hourly_count(&self) -> usize {
        self.hourly_count
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.hourly_count = 0;
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use telemetry::MachineStatus;

    fn snapshot(temperature: f64, pressure: f64) -> MachineSnapshot {
        MachineSnapshot {
            id: "M001".to_string(),
            name: "CNC Mill #1".to_string(),
            status: MachineStatus::Running,
            efficiency: 90.0,
            production: 140.0,
            temperature,
            pressure,
            temp_threshold: 82.3,
            pressure_threshold: 150.0,
            last_update: Utc::now(),
        }
    }

    #[test]
    fn test_evaluate_within_limits() {
        assert!(evaluate(&snapshot(75.0, 120.0)).is_empty());
    }

    #[test]
    fn test_evaluate_temperature_exceedance() {
        let exceedances = evaluate(&snapshot(85.0, 120.0));
        assert_eq!(exceedances.len(), 1);
        assert_eq!(exceedances[0].metric, Metric::Temperature);
        assert_eq!(exceedances[0].key(), "M001/temperature");
    }

    #[test]
    fn test_evaluate_both_metrics() {
        let exceedances = evaluate(&snapshot(85.0, 160.0));
        assert_eq!(exceedances.len(), 2);
    }

    #[test]
    fn test_evaluate_skips_zero_threshold() {
        let mut s = snapshot(85.0, 120.0);
        s.temp_threshold = 0.0;
        assert!(evaluate(&s).is_empty());
    }

    #[test]
    fn test_message_format() {
        let exceedances = evaluate(&snapshot(85.0, 120.0));
        assert_eq!(
            exceedances[0].message(),
            "ALERT: CNC Mill #1 (M001) - TEMPERATURE THRESHOLD EXCEEDED! Current: 85.00, Threshold: 82.3"
        );
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_ratio(105.0, 100.0), Severity::Medium);
        assert_eq!(Severity::from_ratio(112.0, 100.0), Severity::High);
        assert_eq!(Severity::from_ratio(130.0, 100.0), Severity::Critical);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("critical"), Some(Severity::Critical));
        assert_eq!(Severity::parse("high"), Some(Severity::High));
        assert_eq!(Severity::parse("medium"), Some(Severity::Medium));
        assert_eq!(Severity::parse("anything"), None);
    }

    #[test]
    fn test_cooldown_dedupe() {
        let mut manager = AlertManager::default();
        assert!(manager.should_fire("M001/temperature"));
        manager.record_fire("M001/temperature");
        assert!(!manager.should_fire("M001/temperature"));
        // Different key is unaffected.
        assert!(manager.should_fire("M001/pressure"));
    }

    #[test]
    fn test_hourly_throttle() {
        let config = AlertConfig {
            cooldown_seconds: 0,
            max_alerts_per_hour: 3,
        };
        let mut manager = AlertManager::new(config);
        for i in 0..3 {
            let key = format!("M00{}/temperature", i);
            assert!(manager.should_fire(&key));
            manager.record_fire(&key);
        }
        assert!(!manager.should_fire("M009/pressure"));
    }

    #[test]
    fn test_hourly_window_rolls_over() {
        let mut manager = AlertManager::new(AlertConfig {
            cooldown_seconds: 0,
            max_alerts_per_hour: 1,
        });
        assert!(manager.should_fire("M001/temperature"));
        manager.record_fire("M001/temperature");
        assert!(!manager.should_fire("M002/pressure"));

        // Once the window elapses, the counter resets.
        let later = Instant::now() + Duration::from_secs(3601);
        assert!(manager.should_fire_at("M002/pressure", later));
        assert_eq!(manager.hourly_count(), 0);
    }

    #[test]
    fn test_acknowledge_clears_cooldown() {
        let mut manager = AlertManager::default();
        manager.record_fire("M001/temperature");
        assert!(!manager.should_fire("M001/temperature"));
        assert!(manager.acknowledge("M001/temperature"));
        assert!(manager.should_fire("M001/temperature"));
        assert!(!manager.acknowledge("M001/temperature"));
    }
}
