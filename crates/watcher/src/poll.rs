//! Poll loop implementation.

use alerting::{evaluate, AlertManager, Exceedance};
use chrono::Utc;
use notifier::{DispatchRequest, TwilioClient};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage::{AlertRecord, Repository};
use telemetry::{MachineSnapshot, TelemetryClient};
use tracing::{debug, info, warn};

/// Poll loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Seconds between polls
    pub poll_interval_secs: u64,
    /// Log entries fetched per poll
    pub log_fetch_limit: usize,
    /// Destination for threshold alerts; empty disables delivery
    pub alert_phone: String,
    /// Send an SMS when an alert fires
    pub enable_sms: bool,
    /// Place a voice call when an alert fires
    pub enable_call: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            log_fetch_limit: 25,
            alert_phone: String::new(),
            enable_sms: true,
            enable_call: false,
        }
    }
}

/// Evaluate a batch of snapshots and claim dedupe slots for the
/// exceedances that may fire now.
///
/// The slot is claimed here, before any delivery attempt: a failing
/// provider must not re-page on every poll, and the exceedance is
/// recorded in the alert feed regardless of delivery outcome.
pub fn plan_alerts(manager: &mut AlertManager, snapshots: &[MachineSnapshot]) -> Vec<Exceedance> {
    let mut planned = Vec::new();
    for snapshot in snapshots {
        for exceedance in evaluate(snapshot) {
            let key = exceedance.key();
            if manager.should_fire(&key) {
                manager.record_fire(&key);
                planned.push(exceedance);
            }
        }
    }
    planned
}

/// Background telemetry watcher
pub struct Watcher {
    config: WatcherConfig,
    telemetry: Arc<TelemetryClient>,
    repository: Arc<Repository>,
    manager: Arc<Mutex<AlertManager>>,
    notifier: Option<Arc<TwilioClient>>,
    running: AtomicBool,
}

impl Watcher {
    pub fn new(
        config: WatcherConfig,
        telemetry: Arc<TelemetryClient>,
        repository: Arc<Repository>,
        manager: Arc<Mutex<AlertManager>>,
        notifier: Option<Arc<TwilioClient>>,
    ) -> Self {
        Self {
            config,
            telemetry,
            repository,
            manager,
            notifier,
            running: AtomicBool::new(false),
        }
    }

    /// Run the poll loop until stopped.
    pub async fn run(self: Arc<Self>) {
        info!(
            interval_secs = self.config.poll_interval_secs,
            "starting telemetry watcher"
        );
        self.running.store(true, Ordering::SeqCst);
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));

        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            self.tick().await;
        }
        info!("telemetry watcher stopped");
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One poll cycle. Errors are logged, never propagated; the next
    /// tick gets a fresh chance.
    async fn tick(&self) {
        match self.telemetry.machines().await {
            Ok(snapshots) => {
                let planned = {
                    let mut manager = self.manager.lock().unwrap_or_else(|e| e.into_inner());
                    plan_alerts(&mut manager, &snapshots)
                };
                if let Err(e) = self.repository.store_snapshots(snapshots) {
                    warn!(error = %e, "failed to cache snapshots");
                }
                for exceedance in planned {
                    self.fire(&exceedance).await;
                }
            }
            // Thresholds are only compared against live rows; a failed
            // poll must not page anyone about generated data.
            Err(e) => warn!(error = %e, "machine poll failed, skipping evaluation"),
        }

        match self.telemetry.logs(self.config.log_fetch_limit).await {
            Ok(logs) => {
                if let Err(e) = self.repository.insert_logs(logs) {
                    warn!(error = %e, "failed to store event logs");
                }
            }
            Err(e) => debug!(error = %e, "log poll failed"),
        }
    }

    /// Record one fired alert and deliver it if a notifier and
    /// destination are configured.
    async fn fire(&self, exceedance: &Exceedance) {
        let record = AlertRecord::from_exceedance(exceedance, Utc::now().timestamp_millis());
        let message = record.message.clone();
        match self.repository.insert_alert(record) {
            Ok(id) => info!(id, key = %exceedance.key(), "threshold alert fired"),
            Err(e) => warn!(error = %e, "failed to record alert"),
        }

        let deliverable = !self.config.alert_phone.is_empty()
            && (self.config.enable_sms || self.config.enable_call);
        let client = match (&self.notifier, deliverable) {
            (Some(client), true) => client,
            _ => return,
        };

        let request = DispatchRequest {
            phone: self.config.alert_phone.clone(),
            message,
            sms: self.config.enable_sms,
            call: self.config.enable_call,
        };
        if let Err(e) = client.dispatch(&request).await {
            warn!(error = %e, key = %exceedance.key(), "alert delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{AlertConfig, Metric};
    use telemetry::MachineStatus;

    fn snapshot(id: &str, temperature: f64, pressure: f64) -> MachineSnapshot {
        MachineSnapshot {
            id: id.to_string(),
            name: format!("Machine {}", id),
            status: MachineStatus::Running,
            efficiency: 90.0,
            production: 120.0,
            temperature,
            pressure,
            temp_threshold: 82.3,
            pressure_threshold: 150.0,
            last_update: Utc::now(),
        }
    }

    #[test]
    fn test_default_poll_interval_is_five_seconds() {
        let config = WatcherConfig::default();
        assert_eq!(config.poll_interval_secs, 5);
        assert!(config.enable_sms);
        assert!(!config.enable_call);
    }

    #[test]
    fn test_plan_alerts_collects_exceedances() {
        let mut manager = AlertManager::default();
        let snapshots = vec![
            snapshot("M001", 90.0, 100.0),
            snapshot("M002", 70.0, 160.0),
            snapshot("M003", 70.0, 100.0),
        ];
        let planned = plan_alerts(&mut manager, &snapshots);
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].metric, Metric::Temperature);
        assert_eq!(planned[1].metric, Metric::Pressure);
    }

    #[test]
    fn test_plan_alerts_dedupes_across_polls() {
        let mut manager = AlertManager::default();
        let snapshots = vec![snapshot("M001", 90.0, 100.0)];

        let first = plan_alerts(&mut manager, &snapshots);
        assert_eq!(first.len(), 1);

        // Same exceedance on the next poll stays inside the cooldown.
        let second = plan_alerts(&mut manager, &snapshots);
        assert!(second.is_empty());
    }

    #[test]
    fn test_plan_alerts_honors_hourly_cap() {
        let mut manager = AlertManager::new(AlertConfig {
            cooldown_seconds: 0,
            max_alerts_per_hour: 1,
        });
        let snapshots = vec![snapshot("M001", 90.0, 100.0), snapshot("M002", 90.0, 100.0)];
        let planned = plan_alerts(&mut manager, &snapshots);
        assert_eq!(planned.len(), 1);
    }

    #[test]
    fn test_slot_stays_claimed_when_delivery_cannot_happen() {
        // The cooldown slot is claimed at planning time, before any
        // delivery attempt; the record still reaches the feed.
        let mut manager = AlertManager::default();
        let repository = Repository::default();
        let snapshots = vec![snapshot("M001", 90.0, 100.0)];

        let planned = plan_alerts(&mut manager, &snapshots);
        assert_eq!(planned.len(), 1);
        let record = AlertRecord::from_exceedance(&planned[0], Utc::now().timestamp_millis());
        repository.insert_alert(record).unwrap();
        assert_eq!(repository.alert_count(), 1);

        assert!(plan_alerts(&mut manager, &snapshots).is_empty());
    }

    #[test]
    fn test_alert_record_from_exceedance() {
        let mut manager = AlertManager::default();
        let planned = plan_alerts(&mut manager, &[snapshot("M001", 90.0, 100.0)]);
        let record = AlertRecord::from_exceedance(&planned[0], 1_700_000_000_000);
        assert_eq!(record.machine_id, "M001");
        assert_eq!(record.key(), "M001/temperature");
        assert!(!record.acknowledged);
        assert!(record.message.contains("TEMPERATURE THRESHOLD EXCEEDED"));
    }
}
