//! Sample row generators.

use chrono::Utc;
use rand::Rng;
use telemetry::{MachineSnapshot, MachineStatus};
use tracing::debug;

/// Static identity and thresholds for one sample machine.
#[derive(Debug, Clone, Copy)]
pub struct MachineSeed {
    pub id: &'static str,
    pub name: &'static str,
    pub status: MachineStatus,
    pub temp_threshold: f64,
    pub pressure_threshold: f64,
}

/// The fixture fleet used for fallback responses.
pub const SEED_MACHINES: [MachineSeed; 5] = [
    MachineSeed {
        id: "M001",
        name: "CNC Mill #1",
        status: MachineStatus::Running,
        temp_threshold: 82.3,
        pressure_threshold: 150.0,
    },
    MachineSeed {
        id: "M002",
        name: "Lathe #2",
        status: MachineStatus::Running,
        temp_threshold: 80.0,
        pressure_threshold: 140.0,
    },
    MachineSeed {
        id: "M003",
        name: "Press #1",
        status: MachineStatus::Maintenance,
        temp_threshold: 90.0,
        pressure_threshold: 160.0,
    },
    MachineSeed {
        id: "M004",
        name: "Grinder #3",
        status: MachineStatus::Idle,
        temp_threshold: 75.0,
        pressure_threshold: 130.0,
    },
    MachineSeed {
        id: "M005",
        name: "Welder #2",
        status: MachineStatus::Running,
        temp_threshold: 95.0,
        pressure_threshold: 145.0,
    },
];

/// Generate one snapshot per seed machine. Values stay inside the
/// band expected for the machine's status and below its thresholds,
/// so fallback data never looks like an incident.
pub fn sample_machines() -> Vec<MachineSnapshot> {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    debug!("generating fallback machine snapshots");

    SEED_MACHINES
        .iter()
        .map(|seed| {
            let running = seed.status == MachineStatus::Running;
            let (temperature, pressure) = if running {
                (rng.gen_range(60.0..78.0), rng.gen_range(80.0..125.0))
            } else {
                (rng.gen_range(40.0..55.0), rng.gen_range(20.0..50.0))
            };
            let (efficiency, production) = match seed.status {
                MachineStatus::Running => (rng.gen_range(80.0..100.0), rng.gen_range(100.0..180.0)),
                MachineStatus::Idle => (rng.gen_range(0.0..30.0), rng.gen_range(20.0..50.0)),
                _ => (0.0, 0.0),
            };
            MachineSnapshot {
                id: seed.id.to_string(),
                name: seed.name.to_string(),
                status: seed.status,
                efficiency,
                production,
                temperature,
                pressure,
                temp_threshold: seed.temp_threshold,
                pressure_threshold: seed.pressure_threshold,
                last_update: now,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_snapshot_per_seed() {
        let machines = sample_machines();
        assert_eq!(machines.len(), SEED_MACHINES.len());
        assert_eq!(machines[0].id, "M001");
    }

    #[test]
    fn test_snapshots_stay_below_thresholds() {
        for _ in 0..50 {
            for machine in sample_machines() {
                assert!(machine.temperature < machine.temp_threshold);
                assert!(machine.pressure < machine.pressure_threshold);
            }
        }
    }

    #[test]
    fn test_maintenance_machine_is_stopped() {
        let machines = sample_machines();
        let press = machines.iter().find(|m| m.id == "M003").unwrap();
        assert_eq!(press.efficiency, 0.0);
        assert_eq!(press.production, 0.0);
    }

    #[test]
    fn test_snapshots_share_one_timestamp() {
        let machines = sample_machines();
        assert!(machines.iter().all(|m| m.last_update == machines[0].last_update));
    }
}
