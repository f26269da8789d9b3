//! # Drive demands and state broadcasts

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A pair of wheel speed demands, in the native speed units of the wheel actuators.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelCmd {
    /// Left wheel speed
    pub left: f64,

    /// Right wheel speed
    pub right: f64,
}

/// Broadcast of the brain's current state, carrying the state's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBroadcast {
    pub code: u8,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A message emitted by the brain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BrainMsg {
    /// Goes out on the wheel-command channel
    Wheels(WheelCmd),

    /// Goes out on the state-broadcast channel
    State(StateBroadcast),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WheelCmd {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// Both wheels stopped.
    pub fn stop() -> Self {
        Self::default()
    }

    /// Both wheels at the same speed.
    pub fn straight(speed: f64) -> Self {
        Self::new(speed, speed)
    }

    /// Rotate in place, left wheel at `speed` and right wheel at `-speed`.
    pub fn spin(speed: f64) -> Self {
        Self::new(speed, -speed)
    }

    pub fn is_stop(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

impl BrainMsg {
    /// The channel name this message is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            BrainMsg::Wheels(_) => "wheel_cmd",
            BrainMsg::State(_) => "state",
        }
    }

    /// Build the `<topic> <json payload>` packet sent over the network.
    pub fn to_packet(&self) -> Result<String, serde_json::Error> {
        let payload = match self {
            BrainMsg::Wheels(w) => serde_json::to_string(w)?,
            BrainMsg::State(s) => serde_json::to_string(s)?,
        };

        Ok(format!("{} {}", self.topic(), payload))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
