//! # Brain parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::{BrainError, BrainState};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the behaviour controller, loaded from `brain.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BrainParams {
    /// Period of one tick of the state machine.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Nominal wheel speed used by every manoeuvre which isn't PID driven (spins, rotations, the
    /// straight advance in the parking lot). The PID tracked wheel speeds also start from it.
    pub base_speed: f64,

    /// State the machine starts in.
    pub initial_state: BrainState,

    /// If true the machine does nothing until the first error signal arrives.
    #[serde(default = "default_true")]
    pub wait_for_first_signal: bool,

    /// Number of spin ticks after which the robot gives up spinning and picks a direction to turn.
    pub spin_limit_ticks: u32,

    /// Stop count at which the robot resumes line following after a stoplight.
    pub resume_stop_count: u32,

    /// Stop count at which the robot leaves the road for the parking lot.
    pub lot_stop_count: u32,

    /// Seed for the turn direction random source. If not given the source is seeded from entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    pub timers: TimerParams,
}

/// Durations of each one-shot timer.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimerParams {
    /// Stoplight dwell.
    ///
    /// Units: seconds
    pub cooldown_s: f64,

    /// Settle delay at a graph node.
    ///
    /// Units: seconds
    pub node_s: f64,

    /// Length of the rotation pulse when turning at a node.
    ///
    /// Units: seconds
    pub rotate_s: f64,

    /// Length of the pulse used when departing the start node.
    ///
    /// Units: seconds
    pub first_node_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BrainParams {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), BrainError> {
        if !(self.tick_period_s > 0.0) {
            return Err(BrainError::InvalidParams(format!(
                "tick_period_s must be positive, found {}", self.tick_period_s
            )));
        }

        if !self.base_speed.is_finite() {
            return Err(BrainError::InvalidParams(format!(
                "base_speed must be finite, found {}", self.base_speed
            )));
        }

        // Stopping always leaves an odd count and Stopped counts up from the next even one, so
        // each threshold has to sit at least two above the count before it.
        if self.resume_stop_count < 2 || self.lot_stop_count < self.resume_stop_count + 2 {
            return Err(BrainError::InvalidParams(format!(
                "stop counts must satisfy lot_stop_count ({}) >= resume_stop_count ({}) + 2 >= 4",
                self.lot_stop_count,
                self.resume_stop_count
            )));
        }

        let t = &self.timers;
        for (name, val) in [
            ("cooldown_s", t.cooldown_s),
            ("node_s", t.node_s),
            ("rotate_s", t.rotate_s),
            ("first_node_s", t.first_node_s),
        ].iter() {
            if !(*val > 0.0) {
                return Err(BrainError::InvalidParams(format!(
                    "timers.{} must be positive, found {}", name, val
                )));
            }
        }

        Ok(())
    }
}

impl Default for BrainParams {
    fn default() -> Self {
        Self {
            tick_period_s: 0.01,
            base_speed: 8.0,
            initial_state: BrainState::OnPath,
            wait_for_first_signal: true,
            spin_limit_ticks: 500,
            resume_stop_count: 2,
            lot_stop_count: 4,
            seed: None,
            timers: TimerParams::default(),
        }
    }
}

impl Default for TimerParams {
    fn default() -> Self {
        Self {
            cooldown_s: 1.0,
            node_s: 1.75,
            rotate_s: 1.0,
            first_node_s: 0.33,
        }
    }
}

fn default_true() -> bool {
    true
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
