//! Fallback Data
//!
//! The gateway never surfaces an empty dashboard: when the telemetry
//! store errors out or returns nothing, these generators produce
//! plausibly-shaped sample rows. Responses built from them are labeled
//! `source: "fallback"` so callers can tell them apart from live data.

mod sample;

pub use sample::{sample_machines, MachineSeed, SEED_MACHINES};
