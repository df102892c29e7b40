//! Telemetry Store Client
//!
//! Talks to the hosted InfluxDB v2 instance that holds machine metrics
//! and event logs. Builds Flux queries, decodes the annotated-CSV
//! responses, and maps rows into the typed records the rest of the
//! system works with.

mod client;
mod csv;
pub mod flux;
mod rows;

pub use client::{TelemetryClient, TelemetryConfig};
pub use csv::{decode, Record};
pub use rows::{
    DataSource, EventLog, LogKind, MachineHistory, MachineSnapshot, MachineStatus, MetricPoint,
    ProductionSlot,
};

use thiserror::Error;

/// Telemetry store errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("query API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("no rows returned")]
    NoData,
}
