//! # Sensor messages
//!
//! Messages produced by the vision pipeline. The three tracking errors are nominally in [-1, 1],
//! negative meaning the tracked feature is to the left of the image centre and positive to the
//! right.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single update from the vision pipeline.
///
/// Serialised as `{"type": "lane_error", "data": 0.25}` or `{"type": "poi", "data": "stoplight"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SensorMsg {
    /// Position of the lane relative to the image centre
    LaneError(f64),

    /// Position of the parking lot exit relative to the image centre
    GoalError(f64),

    /// Position of the road leading to the next graph node relative to the image centre
    NodeError(f64),

    /// A point of interest notification
    Poi(PoiEvent),
}

/// Point of interest notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoiEvent {
    #[serde(rename = "stoplight")]
    Stoplight,

    #[serde(rename = "obstacle")]
    Obstacle,

    #[serde(rename = "no obstacle")]
    NoObstacle,

    #[serde(rename = "exit parking lot")]
    ExitLot,

    #[serde(rename = "no exit parking lot")]
    NoExitLot,

    #[serde(rename = "graph node")]
    GraphNode,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum SensorParseError {
    #[error("Sensor message contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("\"{0}\" is not a recognised point of interest")]
    UnknownPoi(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SensorMsg {
    /// Parse a new message from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, SensorParseError> {
        serde_json::from_str(json_str).map_err(SensorParseError::InvalidJson)
    }

    /// Serialise the message into a JSON packet
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Returns true if this message carries one of the tracking errors.
    pub fn is_error_signal(&self) -> bool {
        !matches!(self, SensorMsg::Poi(_))
    }
}

impl PoiEvent {
    /// The name of the event as sent by the vision pipeline.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoiEvent::Stoplight => "stoplight",
            PoiEvent::Obstacle => "obstacle",
            PoiEvent::NoObstacle => "no obstacle",
            PoiEvent::ExitLot => "exit parking lot",
            PoiEvent::NoExitLot => "no exit parking lot",
            PoiEvent::GraphNode => "graph node",
        }
    }
}

impl FromStr for PoiEvent {
    type Err = SensorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "stoplight" => Ok(PoiEvent::Stoplight),
            "obstacle" => Ok(PoiEvent::Obstacle),
            "no obstacle" => Ok(PoiEvent::NoObstacle),
            "exit parking lot" => Ok(PoiEvent::ExitLot),
            "no exit parking lot" => Ok(PoiEvent::NoExitLot),
            "graph node" => Ok(PoiEvent::GraphNode),
            other => Err(SensorParseError::UnknownPoi(String::from(other))),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
