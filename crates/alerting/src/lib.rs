//! Alerting
//!
//! Compares polled machine readings against their static thresholds and
//! decides when an exceedance is allowed to page someone: cooldown per
//! (machine, metric) plus an hourly cap across the plant.

mod manager;

pub use manager::{evaluate, AlertConfig, AlertManager, Exceedance, Metric, Severity};
