//! Typed records mapped out of query result rows.

use crate::csv::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reported machine status tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Running,
    Idle,
    Maintenance,
    Unknown,
}

impl MachineStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "running" => Self::Running,
            "idle" => Self::Idle,
            "maintenance" => Self::Maintenance,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Idle => "idle",
            Self::Maintenance => "maintenance",
            Self::Unknown => "unknown",
        }
    }
}

/// Where a gateway response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Influxdb,
    Cache,
    Fallback,
}

/// Latest reading for one machine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSnapshot {
    pub id: String,
    pub name: String,
    pub status: MachineStatus,
    pub efficiency: f64,
    pub production: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub temp_threshold: f64,
    pub pressure_threshold: f64,
    pub last_update: DateTime<Utc>,
}

impl MachineSnapshot {
    /// Map a pivoted result row. Rows without a machine id are dropped;
    /// missing numeric fields default to zero, matching what the
    /// dashboard expects.
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = record.get("machineId")?.to_string();
        Some(Self {
            id,
            name: record
                .get("machineName")
                .unwrap_or("Unknown Machine")
                .to_string(),
            status: MachineStatus::parse(record.get("status").unwrap_or("unknown")),
            efficiency: record.f64_or("efficiency", 0.0),
            production: record.f64_or("production", 0.0),
            temperature: record.f64_or("temperature", 0.0),
            pressure: record.f64_or("pressure", 0.0),
            temp_threshold: record.f64_or("tempThreshold", 0.0),
            pressure_threshold: record.f64_or("pressureThreshold", 0.0),
            last_update: record.time("_time").unwrap_or_else(Utc::now),
        })
    }
}

/// One point on a metric series, carrying the threshold in force
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: i64,
    pub value: f64,
    pub threshold: f64,
}

/// Temperature and pressure series for one machine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineHistory {
    #[serde(rename = "temperatureData")]
    pub temperature: Vec<MetricPoint>,
    #[serde(rename = "pressureData")]
    pub pressure: Vec<MetricPoint>,
}

impl MachineHistory {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty() && self.pressure.is_empty()
    }

    /// Build both series from pivoted history rows.
    pub fn from_records(records: &[Record]) -> Self {
        let mut history = Self::default();
        for record in records {
            let time = match record.time("_time") {
                Some(t) => t.timestamp_millis(),
                None => continue,
            };
            history.temperature.push(MetricPoint {
                timestamp: time,
                value: record.f64_or("temperature", 0.0),
                threshold: record.f64_or("tempThreshold", 0.0),
            });
            history.pressure.push(MetricPoint {
                timestamp: time,
                value: record.f64_or("pressure", 0.0),
                threshold: record.f64_or("pressureThreshold", 0.0),
            });
        }
        history
    }
}

/// Event log category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warning,
    Error,
    Start,
    Stop,
    Maintenance,
}

impl LogKind {
    pub fn parse(value: &str) -> Self {
        match value {
            "warning" => Self::Warning,
            "error" => Self::Error,
            "start" => Self::Start,
            "stop" => Self::Stop,
            "maintenance" => Self::Maintenance,
            _ => Self::Info,
        }
    }
}

/// One machine event log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub machine_id: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub details: String,
}

impl EventLog {
    pub fn from_record(record: &Record) -> Option<Self> {
        let timestamp = record.time("_time")?;
        Some(Self {
            id: format!("log-{}", timestamp.to_rfc3339()),
            timestamp,
            machine_id: record.get("machineId").unwrap_or("Unknown").to_string(),
            kind: LogKind::parse(record.get("type").unwrap_or("info")),
            message: record.get("message").unwrap_or("No message").to_string(),
            details: record.get("details").unwrap_or("No details").to_string(),
        })
    }
}

/// One hourly production aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionSlot {
    pub hour: u32,
    pub actual: f64,
    pub cumulative: f64,
    pub target: f64,
    pub timestamp: DateTime<Utc>,
}
