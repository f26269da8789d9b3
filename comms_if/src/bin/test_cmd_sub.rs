//! Brain command subscriber test

use comms_if::net::{create_socket, zmq, SocketOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {

    // Create context
    let ctx = zmq::Context::new();

    // Create socket
    let socket = create_socket(
        &ctx,
        zmq::SUB,
        SocketOptions::default(),
        "tcp://localhost:5011"
    )?;

    // Recieve messages from the brain, both "wheel_cmd" and "state" topics
    loop {
        let msg = socket.recv_msg(0)?;

        println!("Got message: {:?}", msg.as_str());
    }
}
