//! # Brain telemetry

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use comms_if::drive::WheelCmd;
use serde::Serialize;

use super::{timers::TimerId, BrainState, PoiFlags, Signals};
use crate::route::RoutePair;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Snapshot of the brain's state after a tick.
#[derive(Debug, Clone, Serialize)]
pub struct BrainTm {
    pub state: BrainState,
    pub state_code: u8,
    pub num_ticks: u64,
    pub stop_count: u32,
    pub spin_ticks: u32,
    pub signals: Signals,
    pub poi: PoiFlags,
    pub route_pair: Option<RoutePair>,
    pub route_remaining: usize,
    pub last_wheels: Option<WheelCmd>,
    pub pid_correction: f64,
    pub active_timers: Vec<TimerId>,
    pub complete: bool,
}
