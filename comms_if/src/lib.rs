//! # Communications interface crate.
//!
//! Provides the message payloads exchanged between the brain and its collaborators: sensor data
//! coming in from the vision pipeline, and wheel commands and state broadcasts going out.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Incoming sensor data (tracking errors and points of interest)
pub mod sensor;

/// Outgoing drive demands and state broadcasts
pub mod drive;

/// Network module
#[cfg(feature = "net")]
pub mod net;
