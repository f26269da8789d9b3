//! Differential drive control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for differential drive control
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Params {

    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// The radius of the robot's wheels.
    ///
    /// Units: centimeters
    pub wheel_radius: f64,

    /// Half the distance between the two drive wheels.
    ///
    /// Units: centimeters
    pub half_axle_length: f64
}

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 3.2,
            k_i: 0.0,
            k_d: 0.8,
            wheel_radius: 5.0,
            half_axle_length: 19.5 / 2.0
        }
    }
}
