//! Query gateway client for the hosted store.

use crate::csv::{decode, Record};
use crate::rows::{EventLog, MachineHistory, MachineSnapshot, ProductionSlot};
use crate::{flux, TelemetryError};
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for the telemetry store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Base URL of the InfluxDB v2 instance
    pub url: String,
    /// Organization name
    pub org: String,
    /// API token
    pub token: String,
    /// Bucket holding machine metrics and logs
    pub bucket: String,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            org: "plantwatch".to_string(),
            token: String::new(),
            bucket: "production_monitoring".to_string(),
            timeout_secs: 10,
        }
    }
}

/// HTTP client wrapping the store's query API
pub struct TelemetryClient {
    http: reqwest::Client,
    config: TelemetryConfig,
}

impl TelemetryClient {
    pub fn new(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// Issue a Flux query and decode the CSV response.
    async fn query(&self, flux: &str) -> Result<Vec<Record>, TelemetryError> {
        let url = format!("{}/api/v2/query", self.config.url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .query(&[("org", self.config.org.as_str())])
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Accept", "application/csv")
            .json(&serde_json::json!({
                "query": flux,
                "type": "flux",
                "dialect": { "annotations": [] },
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "telemetry query rejected");
            return Err(TelemetryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let records = decode(&body);
        debug!(rows = records.len(), "telemetry query returned");
        Ok(records)
    }

    /// Latest snapshot per machine. Duplicate machine ids keep the
    /// first row, matching how the dashboard filtered them.
    pub async fn machines(&self) -> Result<Vec<MachineSnapshot>, TelemetryError> {
        let records = self.query(&flux::machines_snapshot(&self.config.bucket)).await?;
        let mut seen = HashSet::new();
        let machines: Vec<MachineSnapshot> = records
            .iter()
            .filter_map(MachineSnapshot::from_record)
            .filter(|m| seen.insert(m.id.clone()))
            .collect();
        if machines.is_empty() {
            return Err(TelemetryError::NoData);
        }
        Ok(machines)
    }

    /// Temperature and pressure history for one machine.
    pub async fn history(&self, machine_id: &str) -> Result<MachineHistory, TelemetryError> {
        let records = self
            .query(&flux::machine_history(&self.config.bucket, machine_id))
            .await?;
        let history = MachineHistory::from_records(&records);
        if history.is_empty() {
            return Err(TelemetryError::NoData);
        }
        Ok(history)
    }

    /// Hourly production slots over the trailing day, with running
    /// cumulative output and the target line for each hour.
    pub async fn production(
        &self,
        machine_id: Option<&str>,
        hourly_target: f64,
    ) -> Result<Vec<ProductionSlot>, TelemetryError> {
        let records = self
            .query(&flux::production(&self.config.bucket, machine_id))
            .await?;

        let mut slots = Vec::new();
        let mut cumulative = 0.0;
        for record in &records {
            let timestamp = match record.time("_time") {
                Some(t) => t,
                None => continue,
            };
            let actual = record.f64_or("_value", 0.0);
            cumulative += actual;
            let hour = timestamp.hour();
            slots.push(ProductionSlot {
                hour,
                actual,
                cumulative,
                target: hourly_target * f64::from(hour + 1),
                timestamp,
            });
        }

        if slots.is_empty() {
            return Err(TelemetryError::NoData);
        }
        // Keep at most one day of slots.
        let start = slots.len().saturating_sub(24);
        Ok(slots.split_off(start))
    }

    /// Recent event log entries, newest first.
    pub async fn logs(&self, limit: usize) -> Result<Vec<EventLog>, TelemetryError> {
        let records = self.query(&flux::recent_logs(&self.config.bucket, limit)).await?;
        Ok(records.iter().filter_map(EventLog::from_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.bucket, "production_monitoring");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.token.is_empty());
    }

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(TelemetryClient::new(TelemetryConfig::default()).is_ok());
    }
}
