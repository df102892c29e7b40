//! Watcher
//!
//! Replaces the browser's polling loop server-side: every few seconds
//! it refreshes machine snapshots and event logs from the telemetry
//! store, compares the latest readings against their thresholds, and
//! pushes SMS/voice alerts through the notifier when the alert manager
//! lets one through. Poll failures are logged and skipped; the loop
//! never dies on a bad cycle.

mod poll;

pub use poll::{plan_alerts, Watcher, WatcherConfig};
