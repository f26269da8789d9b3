//! # Sensor script interpreter module
//!
//! This module provides an interpreter for sensor scripts, which replay timed sensor messages
//! into the brain in place of the live vision pipeline. A script is made of entries such as
//!
//! ```text
//! 0.00: {"type": "lane_error", "data": 0.0};
//! 1.50: {"type": "poi", "data": "stoplight"};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use comms_if::sensor::{SensorMsg, SensorParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A sensor message which is scripted to arrive at a specific time.
#[derive(Debug)]
pub struct Entry {
    /// The time the message is supposed to arrive at
    exec_time_s: f64,

    /// The message to deliver
    msg: SensorMsg
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending` to
/// acquire a list of sensor messages that are due.
#[derive(Debug)]
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    entries: VecDeque<Entry>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid sensor message at {0} s: {1}")]
    InvalidMsg(f64, SensorParseError),

    #[error("Script entries must be in time order, {0} s follows {1} s")]
    OutOfOrder(f64, f64)
}

#[derive(Debug, PartialEq)]
pub enum PendingMsgs {
    None,
    Some(Vec<SensorMsg>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.to_string_lossy().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e))
        };

        Ok(ScriptInterpreter {
            entries: Self::parse(&script)?,
            _script_path: path
        })
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        Ok(ScriptInterpreter {
            _script_path: PathBuf::new(),
            entries: Self::parse(script)?
        })
    }

    /// Return the messages which are due at `current_time_s`.
    ///
    /// Messages are returned in script order, `EndOfScript` is returned once every message has
    /// been delivered.
    pub fn get_pending(&mut self, current_time_s: f64) -> PendingMsgs {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.entries.is_empty() {
            return PendingMsgs::EndOfScript
        }

        let mut msg_vec: Vec<SensorMsg> = vec![];

        // Pop items from the queue while the head's exec time has been reached
        while let Some(entry) = self.entries.front() {
            if entry.exec_time_s > current_time_s {
                break;
            }

            if let Some(entry) = self.entries.pop_front() {
                msg_vec.push(entry.msg);
            }
        }

        // If the vector is longer than 0 return Some, otherwise None
        if !msg_vec.is_empty() {
            PendingMsgs::Some(msg_vec)
        }
        else {
            PendingMsgs::None
        }
    }

    /// Get the number of messages remaining in the script
    pub fn get_num_msgs(&self) -> usize {
        self.entries.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.entries.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    fn parse(script: &str) -> Result<VecDeque<Entry>, ScriptError> {
        // Empty queue of entries
        let mut queue: VecDeque<Entry> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("script regex is valid");

        for cap in re.captures_iter(script) {
            // Parse the exec time
            let exec_time_s: f64 = match cap[1].parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e)))
            };

            // Entries must be sorted so that pending messages can be popped from the front
            if let Some(prev) = queue.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(exec_time_s, prev.exec_time_s));
                }
            }

            // Parse the message from the payload. The scripts contain JSON only.
            let msg = match SensorMsg::from_json(&cap[3]) {
                Ok(m) => m,
                Err(e) => return Err(ScriptError::InvalidMsg(
                    exec_time_s, e
                ))
            };

            queue.push_back(Entry {
                exec_time_s,
                msg
            });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(queue)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
