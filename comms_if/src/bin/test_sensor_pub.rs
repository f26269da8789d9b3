//! Sensor publisher test
//!
//! Stands in for the vision pipeline: publishes a slowly oscillating lane error, and a stoplight
//! every ten seconds, on the sensor endpoint.

use comms_if::{
    net::{create_socket, zmq, SocketOptions},
    sensor::{PoiEvent, SensorMsg},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {

    // Create zmq context
    let ctx = zmq::Context::new();

    // Create socket options
    let socket_options = SocketOptions {
        bind: true,
        ..Default::default()
    };

    // Create the socket
    let socket = create_socket(
        &ctx,
        zmq::PUB,
        socket_options,
        "tcp://*:5010"
    )?;

    println!("Sensor publisher open on port 5010");

    let mut step: u64 = 0;

    loop {
        let lane_error = 0.2 * (step as f64 * 0.05).sin();

        match socket.send(&SensorMsg::LaneError(lane_error).to_json()?, 0) {
            Ok(_) => (),
            Err(e) => println!("Failed to send lane error: {}", e)
        }

        if step % 200 == 199 {
            socket.send(&SensorMsg::Poi(PoiEvent::Stoplight).to_json()?, 0).ok();
            println!("Sent stoplight");
        }

        step += 1;
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}
