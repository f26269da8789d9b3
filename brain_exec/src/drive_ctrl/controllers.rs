//! # Drive controllers module
//!
//! This module provides the incremental (velocity form) PID controller used to steer the robot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An incremental PID controller.
///
/// Rather than computing the whole control output from the error each call, this controller
/// computes the change in output from the last two errors and adds it onto a running correction,
/// `u`. The correction is never reset, it carries forward across every call.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct IncrementalPid {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    e_1: f64,

    /// Error before the previous one
    e_2: f64,

    /// The accumulated correction
    u: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IncrementalPid {

    /// Create a new controller with the given gains and an empty history.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            e_1: 0f64,
            e_2: 0f64,
            u: 0f64
        }
    }

    /// Push a new error through the controller, returning the updated correction.
    pub fn update(&mut self, error: f64) -> f64 {
        let p = self.k_p * (error - self.e_1);
        let i = self.k_i * (error + self.e_1);
        let d = self.k_d * (error - 2.0 * self.e_1 + self.e_2);

        self.u += p + i + d;

        // Shift the error history
        self.e_2 = self.e_1;
        self.e_1 = error;

        trace!("PID e_1: {}, e_2: {}, u: {}", self.e_1, self.e_2, self.u);

        self.u
    }

    /// The accumulated correction
    pub fn correction(&self) -> f64 {
        self.u
    }

    /// The error history as `(e_1, e_2)`
    pub fn history(&self) -> (f64, f64) {
        (self.e_1, self.e_2)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_error_keeps_zero_correction() {
        let mut pid = IncrementalPid::new(3.2, 0.0, 0.8);

        for _ in 0..100 {
            assert_eq!(pid.update(0.0), 0.0);
        }
        assert_eq!(pid.history(), (0.0, 0.0));
    }

    #[test]
    fn test_step_response() {
        let mut pid = IncrementalPid::new(3.2, 0.0, 0.8);

        // First call: P = 3.2 * 0.5, D = 0.8 * 0.5
        let u = pid.update(0.5);
        assert!((u - 2.0).abs() < 1e-12);
        assert_eq!(pid.history(), (0.5, 0.0));

        // Same error again: P = 0, D = 0.8 * (0.5 - 1.0) = -0.4
        let u = pid.update(0.5);
        assert!((u - 1.6).abs() < 1e-12);

        // Steady error: no further change in the correction
        let u = pid.update(0.5);
        assert!((u - 1.6).abs() < 1e-12);
        assert_eq!(pid.correction(), u);
    }

    #[test]
    fn test_integral_term() {
        let mut pid = IncrementalPid::new(0.0, 1.0, 0.0);

        // I = k_i * (e + e_1)
        assert_eq!(pid.update(1.0), 1.0);
        assert_eq!(pid.update(1.0), 3.0);
        assert_eq!(pid.update(0.0), 4.0);
    }
}
