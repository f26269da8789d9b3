//! # Command Server
//!
//! Publishes the brain's wheel commands and state broadcasts as `<topic> <json>` packets.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    drive::BrainMsg,
    net::{create_socket, zmq, NetError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command server
pub struct CmdServer {
    socket: zmq::Socket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CmdServerError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not send the command: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the command: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdServer {
    /// Create a new instance of the command server, bound to the command endpoint.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, CmdServerError> {
        let socket_options = SocketOptions {
            bind: true,
            linger: 1,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = create_socket(ctx, zmq::PUB, socket_options, &params.cmd_endpoint)
            .map_err(CmdServerError::SocketError)?;

        Ok(Self { socket })
    }

    /// Publish a single message.
    pub fn send(&self, msg: &BrainMsg) -> Result<(), CmdServerError> {
        let packet = msg.to_packet()
            .map_err(CmdServerError::SerializationError)?;

        self.socket.send(&packet, 0)
            .map_err(CmdServerError::SendError)
    }
}
