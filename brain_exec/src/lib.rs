//! # Brain library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the brain crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Behaviour state machine - sequences line following, the parking lot and the road graph
pub mod brain;

/// Global data store for the executable
pub mod data_store;

/// Differential drive control - converts a tracking error into wheel speeds
pub mod drive_ctrl;

/// Route planning - the node pairs to traverse and how to turn at each
pub mod route;

/// Sensor client - receives error signals and points of interest from the vision pipeline
#[cfg(feature = "net")]
pub mod sensor_client;

/// Command server - publishes wheel commands and state broadcasts
#[cfg(feature = "net")]
pub mod cmd_server;
