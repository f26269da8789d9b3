//! # Differential drive control module
//!
//! Converts a single tracking error into a pair of wheel speeds. The error is passed through an
//! [`IncrementalPid`] to produce a steering correction `U`, which is then applied differentially
//! about the robot's current forward velocity:
//!
//! ```text
//! v   = r * (w1 + w2) / 2
//! w1' = v / r + (L / r) * U
//! w2' = v / r - (L / r) * U
//! ```
//!
//! where `r` is the wheel radius and `L` is half the axle length.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controllers;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::Serialize;

pub use controllers::IncrementalPid;
pub use params::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Differential drive controller.
///
/// Owns its own error history, so two controllers with the same history always produce the same
/// wheel speeds for the same inputs.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiffDriveCtrl {
    #[serde(skip)]
    params: Params,

    pid: IncrementalPid
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DiffDriveCtrl initialisation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid drive parameters: {0}")]
    InvalidParams(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DiffDriveCtrl {

    /// Create a new controller from the parameters.
    pub fn new(params: Params) -> Result<Self, DriveCtrlError> {
        if !(params.wheel_radius > 0.0) {
            return Err(DriveCtrlError::InvalidParams(format!(
                "wheel radius must be positive, found {}", params.wheel_radius
            )));
        }
        if params.half_axle_length < 0.0 {
            return Err(DriveCtrlError::InvalidParams(format!(
                "half axle length must not be negative, found {}", params.half_axle_length
            )));
        }

        Ok(Self {
            params,
            pid: IncrementalPid::new(params.k_p, params.k_i, params.k_d)
        })
    }

    /// Load the parameters from the given file and create the controller.
    pub fn init(params_path: &str) -> Result<Self, DriveCtrlError> {
        let params = util::params::load(params_path)
            .map_err(DriveCtrlError::ParamLoadError)?;

        Self::new(params)
    }

    /// Calculate new wheel speeds from the current wheel speeds and the tracking error.
    ///
    /// `w1` is the left wheel and `w2` the right wheel.
    pub fn calc_wheel_speeds(&mut self, w1: f64, w2: f64, error: f64) -> (f64, f64) {
        let u = self.pid.update(error);
        let vel = self.forward_velocity(w1, w2);

        let r_inv = 1.0 / self.params.wheel_radius;
        let speeds = (
            r_inv * (vel + self.params.half_axle_length * u),
            r_inv * (vel - self.params.half_axle_length * u)
        );

        trace!("DiffDriveCtrl: error {} -> wheels {:?}", error, speeds);

        speeds
    }

    /// Linear forward velocity from the given wheel speeds.
    pub fn forward_velocity(&self, w1: f64, w2: f64) -> f64 {
        self.params.wheel_radius * (w1 + w2) / 2.0
    }

    /// The accumulated steering correction.
    pub fn correction(&self) -> f64 {
        self.pid.correction()
    }

    /// The controller's error history as `(e_1, e_2)`.
    pub fn history(&self) -> (f64, f64) {
        self.pid.history()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn ctrl(half_axle_length: f64) -> DiffDriveCtrl {
        DiffDriveCtrl::new(Params {
            half_axle_length,
            ..Default::default()
        }).unwrap()
    }

    #[test]
    fn test_dead_on() {
        let mut dl = ctrl(10.0);

        let (w1, w2) = dl.calc_wheel_speeds(5.0, 5.0, 0.0);
        assert_eq!((w1, w2), (5.0, 5.0));
        assert_eq!(dl.correction(), 0.0);
    }

    #[test]
    fn test_drift_is_symmetric() {
        // Lane to the right steers one way, lane to the left the other, by the same amount
        let (l1, r1) = ctrl(10.0).calc_wheel_speeds(5.0, 5.0, 0.2);
        let (l2, r2) = ctrl(10.0).calc_wheel_speeds(5.0, 5.0, -0.2);

        assert!(l1 > r1);
        assert!(l2 < r2);
        assert!((l1 - r2).abs() < 1e-12);
        assert!((r1 - l2).abs() < 1e-12);

        // Forward velocity is preserved
        assert!(((l1 + r1) / 2.0 - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_values() {
        let mut dl = DiffDriveCtrl::new(Params::default()).unwrap();

        // U = 3.2 * 0.5 + 0.8 * 0.5 = 2.0, v / r = 8.0, L / r = 1.95
        let (w1, w2) = dl.calc_wheel_speeds(8.0, 8.0, 0.5);
        assert!((w1 - (8.0 + 1.95 * 2.0)).abs() < 1e-9);
        assert!((w2 - (8.0 - 1.95 * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_identical_history_identical_output() {
        let mut a = DiffDriveCtrl::new(Params::default()).unwrap();
        let mut b = DiffDriveCtrl::new(Params::default()).unwrap();

        let errors = [0.3, -0.1, 0.25, 0.0, -0.4];
        let (mut wa, mut wb) = ((8.0, 8.0), (8.0, 8.0));

        for e in errors.iter() {
            wa = a.calc_wheel_speeds(wa.0, wa.1, *e);
            wb = b.calc_wheel_speeds(wb.0, wb.1, *e);

            assert_eq!(wa.0.to_bits(), wb.0.to_bits());
            assert_eq!(wa.1.to_bits(), wb.1.to_bits());
        }
        assert_eq!(a, b);

        // A cloned controller continues identically
        let mut c = a.clone();
        assert_eq!(
            a.calc_wheel_speeds(7.0, 9.0, 0.1),
            c.calc_wheel_speeds(7.0, 9.0, 0.1)
        );
    }

    #[test]
    fn test_correction_persists() {
        let mut dl = DiffDriveCtrl::new(Params::default()).unwrap();

        dl.calc_wheel_speeds(8.0, 8.0, 0.5);
        let u = dl.correction();

        // A zero error after a step leaves part of the correction in place
        dl.calc_wheel_speeds(8.0, 8.0, 0.0);
        assert!(dl.correction() != 0.0);
        assert!(dl.correction() != u);
    }

    #[test]
    fn test_invalid_params() {
        assert!(DiffDriveCtrl::new(Params {
            wheel_radius: 0.0,
            ..Default::default()
        }).is_err());
        assert!(DiffDriveCtrl::new(Params {
            half_axle_length: -1.0,
            ..Default::default()
        }).is_err());
    }
}
