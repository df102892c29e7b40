//! Flux query builders.
//!
//! Every query the gateway issues is a fixed shape; only the bucket,
//! machine id, and limits are interpolated, and those are escaped
//! before they reach the query text.

/// Escape a string for embedding inside a double-quoted Flux literal.
pub fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Latest snapshot per machine over the trailing hour.
pub fn machines_snapshot(bucket: &str) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: -1h)
  |> filter(fn: (r) => r._measurement == "machine_metrics")
  |> last()
  |> pivot(rowKey: ["_time"], columnKey: ["_field"], valueColumn: "_value")
  |> group()"#,
        bucket = escape(bucket),
    )
}

/// Temperature and pressure series (with thresholds) for one machine
/// over the trailing 30 minutes.
pub fn machine_history(bucket: &str, machine_id: &str) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: -30m)
  |> filter(fn: (r) => r._measurement == "machine_metrics" and r.machineId == "{id}")
  |> filter(fn: (r) => r._field == "temperature" or r._field == "pressure" or r._field == "tempThreshold" or r._field == "pressureThreshold")
  |> pivot(rowKey: ["_time"], columnKey: ["_field"], valueColumn: "_value")"#,
        bucket = escape(bucket),
        id = escape(machine_id),
    )
}

/// Hourly mean production over the trailing 24 hours. `None` covers the
/// whole fleet.
pub fn production(bucket: &str, machine_id: Option<&str>) -> String {
    let machine_filter = match machine_id {
        Some(id) => format!(" and r.machineId == \"{}\"", escape(id)),
        None => String::new(),
    };
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: -24h)
  |> filter(fn: (r) => r._measurement == "machine_metrics" and r._field == "production"{machine_filter})
  |> aggregateWindow(every: 1h, fn: mean, createEmpty: false)"#,
        bucket = escape(bucket),
        machine_filter = machine_filter,
    )
}

/// Most recent event log entries, newest first.
pub fn recent_logs(bucket: &str, limit: usize) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: -24h)
  |> filter(fn: (r) => r._measurement == "machine_logs")
  |> filter(fn: (r) => r._field == "message" or r._field == "details")
  |> pivot(rowKey: ["_time"], columnKey: ["_field"], valueColumn: "_value")
  |> sort(columns: ["_time"], desc: true)
  |> limit(n: {limit})"#,
        bucket = escape(bucket),
        limit = limit,
    )
}
