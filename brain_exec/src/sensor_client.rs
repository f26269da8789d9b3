//! # Sensor Client
//!
//! Subscribes to the sensor messages published by the vision pipeline.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{create_socket, zmq, NetError, NetParams, SocketOptions},
    sensor::{SensorMsg, SensorParseError},
};
use log::warn;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sensor client
pub struct SensorClient {
    socket: zmq::Socket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SensorClientError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not recieve a message from the pipeline: {0}")]
    RecvError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SensorClient {
    /// Create a new instance of the sensor client.
    ///
    /// This function will not block until the publisher connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, SensorClientError> {
        let socket_options = SocketOptions {
            connect_timeout: 1000,
            linger: 1,
            recv_timeout: 0,
            ..Default::default()
        };

        let socket = create_socket(ctx, zmq::SUB, socket_options, &params.sensor_endpoint)
            .map_err(SensorClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// Recieve every message which has arrived since the last call, in arrival order.
    ///
    /// Messages which cannot be parsed are logged and dropped.
    pub fn recieve_msgs(&self) -> Result<Vec<SensorMsg>, SensorClientError> {
        let mut msgs = Vec::new();

        loop {
            let msg_str = match self.socket.recv_string(zmq::DONTWAIT) {
                Ok(Ok(s)) => s,
                Ok(Err(_)) => {
                    warn!("Sensor message was not valid UTF-8, dropped");
                    continue;
                }
                // Nothing left to read this cycle
                Err(zmq::Error::EAGAIN) => break,
                Err(e) => return Err(SensorClientError::RecvError(e)),
            };

            match parse(&msg_str) {
                Ok(m) => msgs.push(m),
                Err(e) => warn!("Could not parse sensor message \"{}\": {}", msg_str, e),
            }
        }

        Ok(msgs)
    }
}

/// Parse a message as sent by the pipeline.
///
/// Full JSON messages are accepted, as are bare point of interest names.
fn parse(msg_str: &str) -> Result<SensorMsg, SensorParseError> {
    match SensorMsg::from_json(msg_str) {
        Ok(m) => Ok(m),
        Err(e) => msg_str.parse().map(SensorMsg::Poi).map_err(|_| e),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
