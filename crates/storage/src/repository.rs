//! Repository implementation.

use crate::StorageError;
use alerting::{Exceedance, Metric, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::{debug, info};

use telemetry::{EventLog, MachineSnapshot};

/// A fired alert, as surfaced on the alerts endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: i64,
    pub timestamp_ms: i64,
    pub machine_id: String,
    pub metric: Metric,
    pub value: f64,
    pub threshold: f64,
    pub severity: Severity,
    pub message: String,
    pub acknowledged: bool,
}

impl AlertRecord {
    /// Build an unacknowledged record from an observed exceedance.
    /// The id is assigned on insert.
    pub fn from_exceedance(exceedance: &Exceedance, timestamp_ms: i64) -> Self {
        Self {
            id: 0,
            timestamp_ms,
            machine_id: exceedance.machine_id.clone(),
            metric: exceedance.metric,
            value: exceedance.value,
            threshold: exceedance.threshold,
            severity: exceedance.severity(),
            message: exceedance.message(),
            acknowledged: false,
        }
    }

    /// The dedupe key this record corresponds to.
    pub fn key(&self) -> String {
        format!("{}/{}", self.machine_id, self.metric)
    }
}

/// Retention caps
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub max_log_entries: usize,
    pub max_alert_records: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            max_log_entries: 500,
            max_alert_records: 1_000,
        }
    }
}

/// In-memory repository for the server's working set
pub struct Repository {
    snapshots: Mutex<HashMap<String, MachineSnapshot>>,
    logs: Mutex<VecDeque<EventLog>>,
    alerts: Mutex<Vec<AlertRecord>>,
    next_alert_id: Mutex<i64>,
    config: RepositoryConfig,
}

impl Repository {
    pub fn new(config: RepositoryConfig) -> Self {
        info!("creating in-memory repository");
        Self {
            snapshots: Mutex::new(HashMap::new()),
            logs: Mutex::new(VecDeque::with_capacity(config.max_log_entries)),
            alerts: Mutex::new(Vec::new()),
            next_alert_id: Mutex::new(1),
            config,
        }
    }

    fn lock_err<T>(e: std::sync::PoisonError<T>) -> StorageError {
        StorageError::Lock(e.to_string())
    }

    /// Upsert the latest snapshot for each machine in the batch.
    pub fn store_snapshots(&self, batch: Vec<MachineSnapshot>) -> Result<(), StorageError> {
        let mut snapshots = self.snapshots.lock().map_err(Self::lock_err)?;
        for snapshot in batch {
            snapshots.insert(snapshot.id.clone(), snapshot);
        }
        Ok(())
    }

    /// All known snapshots, ordered by machine id.
    pub fn snapshots(&self) -> Result<Vec<MachineSnapshot>, StorageError> {
        let snapshots = self.snapshots.lock().map_err(Self::lock_err)?;
        let mut all: Vec<MachineSnapshot> = snapshots.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    pub fn snapshot(&self, machine_id: &str) -> Result<MachineSnapshot, StorageError> {
        let snapshots = self.snapshots.lock().map_err(Self::lock_err)?;
        snapshots.get(machine_id).cloned().ok_or(StorageError::NotFound)
    }

    /// Insert log entries, skipping ids already stored. Oldest entries
    /// are evicted past the retention cap.
    pub fn insert_logs(&self, batch: Vec<EventLog>) -> Result<usize, StorageError> {
        let mut logs = self.logs.lock().map_err(Self::lock_err)?;
        let mut inserted = 0;
        for entry in batch {
            if logs.iter().any(|existing| existing.id == entry.id) {
                continue;
            }
            logs.push_back(entry);
            inserted += 1;
        }
        if inserted > 0 {
            // Sort newest-first, then trim from the old end.
            logs.make_contiguous()
                .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            while logs.len() > self.config.max_log_entries {
                logs.pop_back();
            }
            debug!(inserted, total = logs.len(), "event logs stored");
        }
        Ok(inserted)
    }

    /// Most recent log entries, newest first.
    pub fn logs(&self, limit: usize) -> Result<Vec<EventLog>, StorageError> {
        let logs = self.logs.lock().map_err(Self::lock_err)?;
        Ok(logs.iter().take(limit).cloned().collect())
    }

    /// Append a fired alert, assigning its id.
    pub fn insert_alert(&self, mut record: AlertRecord) -> Result<i64, StorageError> {
        let mut alerts = self.alerts.lock().map_err(Self::lock_err)?;
        let mut next_id = self.next_alert_id.lock().map_err(Self::lock_err)?;

        record.id = *next_id;
        *next_id += 1;

        if alerts.len() >= self.config.max_alert_records {
            alerts.remove(0);
        }
        let id = record.id;
        alerts.push(record);
        debug!(id, "alert recorded");
        Ok(id)
    }

    /// Fired alerts, newest first, optionally filtered by severity.
    pub fn alerts(
        &self,
        severity: Option<Severity>,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, StorageError> {
        let alerts = self.alerts.lock().map_err(Self::lock_err)?;
        Ok(alerts
            .iter()
            .rev()
            .filter(|a| severity.map_or(true, |s| a.severity == s))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Mark an alert acknowledged, returning the updated record.
    pub fn acknowledge_alert(&self, id: i64) -> Result<AlertRecord, StorageError> {
        let mut alerts = self.alerts.lock().map_err(Self::lock_err)?;
        let record = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StorageError::NotFound)?;
        record.acknowledged = true;
        Ok(record.clone())
    }

    pub fn unacknowledged_count(&self) -> usize {
        self.alerts
            .lock()
            .map(|a| a.iter().filter(|r| !r.acknowledged).count())
            .unwrap_or(0)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn log_count(&self) -> usize {
        self.logs.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }

    /// Clear all data (for testing).
    pub fn clear(&self) {
        if let Ok(mut snapshots) = self.snapshots.lock() {
            snapshots.clear();
        }
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new(RepositoryConfig::default())
    }
}
