//! # Data Store

use comms_if::{drive::BrainMsg, sensor::SensorMsg};

use crate::brain::BrainTm;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Debug, Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Time of this cycle, either the session time or the replayed script time
    pub time_s: f64,

    // Brain
    /// Sensor messages received this cycle, in arrival order
    pub brain_input: Vec<SensorMsg>,

    /// Messages emitted by the brain this cycle
    pub brain_output: Vec<BrainMsg>,

    /// The latest brain telemetry
    pub brain_tm: Option<BrainTm>,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Total number of sensor messages received
    pub num_sensor_msgs: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, time_s: f64) {
        let cycles_per_s = (cycle_frequency_hz.round() as u64).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;

        self.brain_input.clear();
        self.brain_output.clear();

        self.time_s = time_s;
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_sensor_msgs += self.brain_input.len() as u64;
        self.num_cycles += 1;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
