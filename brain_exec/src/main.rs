//! Main brain executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and the brain
//!     - Main loop, once per tick period:
//!         - Sensor input acquisition, from a script or the vision pipeline
//!         - Brain processing
//!         - Wheel command and state broadcast output
//!     - On exit stop the brain and save its final telemetry

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use brain_lib::{
    brain::{Brain, BrainInitData},
    data_store::DataStore,
};
#[cfg(feature = "net")]
use brain_lib::{cmd_server::CmdServer, sensor_client::SensorClient};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use comms_if::drive::BrainMsg;
use util::{
    host,
    logger::{level_from_verbosity, logger_init},
    script_interpreter::{PendingMsgs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive overruns after which the overrun warning is repeated only once a second.
const OVERRUN_WARN_LIMIT: u64 = 10;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options of the executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "brain_exec", about = "Geekbot behaviour executable")]
struct Opts {
    /// Node of the road graph to drive to
    #[structopt(short, long)]
    target: u32,

    /// Sensor script to replay instead of listening to the vision pipeline
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Replay the script as fast as possible rather than in real time
    #[structopt(short, long)]
    fast: bool,

    /// Seed for the turn direction random source, overrides the parameter file
    #[structopt(long)]
    seed: Option<u64>,

    /// Verbosity, `-v` logs at debug level and `-vv` at trace level
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

/// Destination of the brain's wheel commands and state broadcasts.
struct CmdOutput {
    #[cfg(feature = "net")]
    server: CmdServer,

    /// Number of messages which could not be sent
    num_send_errors: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the sensor messages incoming to the exec.
enum InputSource {
    #[cfg(feature = "net")]
    Remote(SensorClient),
    Script(ScriptInterpreter),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("brain_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(level_from_verbosity(opts.verbose), &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Geekbot Brain Executable\n");
    info!(
        "Running on: {}",
        host::get_hostname().unwrap_or_else(|| String::from("unknown host"))
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- INITIALISE BRAIN ----

    info!("Initialising brain...");

    let mut brain = Brain::init(&BrainInitData {
        brain_params_path: String::from("brain.toml"),
        drive_ctrl_params_path: String::from("drive_ctrl.toml"),
        route_params_path: String::from("route.toml"),
        target: opts.target,
        seed: opts.seed,
    }).wrap_err("Failed to initialise the Brain")?;

    let tick_period_s = brain.params.tick_period_s;
    let tick_frequency_hz = 1.0 / tick_period_s;

    info!("Brain init complete, tick period {} s\n", tick_period_s);

    // ---- INITIALISE INPUT SOURCE AND NETWORK ----

    #[cfg(feature = "net")]
    let zmq_ctx = comms_if::net::zmq::Context::new();

    #[cfg(feature = "net")]
    let net_params: comms_if::net::NetParams = util::params::load("net.toml")
        .wrap_err("Could not load net params")?;

    let mut input_source = match opts.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path)
                .wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} messages\n",
                si.get_duration(),
                si.get_num_msgs()
            );

            InputSource::Script(si)
        }
        #[cfg(feature = "net")]
        None => {
            info!("No script provided, listening to the vision pipeline");

            let c = SensorClient::new(&zmq_ctx, &net_params)
                .wrap_err("Failed to initialise the SensorClient")?;
            info!("SensorClient initialised");

            InputSource::Remote(c)
        }
        #[cfg(not(feature = "net"))]
        None => {
            return Err(color_eyre::eyre::eyre!(
                "No script provided and the network stack is disabled, rebuild with the \"net\" \
                feature to listen to the vision pipeline"
            ))
        }
    };

    let mut output = CmdOutput {
        #[cfg(feature = "net")]
        server: {
            let s = CmdServer::new(&zmq_ctx, &net_params)
                .wrap_err("Failed to initialise the CmdServer")?;
            info!("CmdServer initialised");
            s
        },
        num_send_errors: 0,
    };

    // ---- MAIN LOOP ----

    let mut ds = DataStore::default();

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // In fast replay the clock is the tick count, otherwise the session clock
        let time_s = match (&input_source, opts.fast) {
            (InputSource::Script(_), true) => ds.num_cycles as f64 * tick_period_s,
            _ => session::get_elapsed_seconds(),
        };

        ds.cycle_start(tick_frequency_hz, time_s);

        // ---- SENSOR INPUT ----

        match input_source {
            #[cfg(feature = "net")]
            InputSource::Remote(ref client) => match client.recieve_msgs() {
                Ok(msgs) => ds.brain_input = msgs,
                Err(e) => warn!("Could not recieve sensor messages: {}", e),
            },
            InputSource::Script(ref mut si) => match si.get_pending(time_s) {
                PendingMsgs::None => (),
                PendingMsgs::Some(msgs) => ds.brain_input = msgs,
                PendingMsgs::EndOfScript => {
                    info!("End of sensor script reached, stopping");
                    break;
                }
            },
        }

        // ---- BRAIN PROCESSING ----

        let (msgs, tm) = brain.proc(&ds.brain_input);
        ds.brain_output = msgs;

        if ds.is_1_hz_cycle {
            debug!("Brain in {} ({:?} pair)", tm.state, tm.route_pair);
        }
        ds.brain_tm = Some(tm);

        // ---- OUTPUT ----

        output.send(&ds.brain_output);

        // ---- CYCLE MANAGEMENT ----

        ds.cycle_end();

        if opts.fast {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(tick_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns < OVERRUN_WARN_LIMIT || ds.is_1_hz_cycle {
                    warn!(
                        "Cycle overran by {:.06} s ({} consecutive)",
                        cycle_dur.as_secs_f64() - tick_period_s,
                        ds.num_consec_cycle_overruns
                    );
                }
            }
        }
    }

    // ---- SHUTDOWN ----

    let stop_msgs = brain.shutdown();
    output.send(&stop_msgs);

    let tm = brain.tm();
    info!(
        "Final state {} after {} ticks, route complete: {}",
        tm.state,
        tm.num_ticks,
        tm.complete
    );

    session.save("brain_tm.json", &tm)
        .wrap_err("Failed to save the brain telemetry")?;

    if output.num_send_errors > 0 {
        warn!("{} messages could not be sent", output.num_send_errors);
    }

    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdOutput {
    /// Publish the brain's output, logging each message.
    fn send(&mut self, msgs: &[BrainMsg]) {
        for msg in msgs {
            #[cfg(feature = "net")]
            {
                if let Err(e) = self.server.send(msg) {
                    warn!("Could not send {}: {}", msg.topic(), e);
                    self.num_send_errors += 1;
                }
            }

            match msg {
                BrainMsg::Wheels(w) => debug!("wheel_cmd: ({:.3}, {:.3})", w.left, w.right),
                BrainMsg::State(s) => debug!("state: {}", s.code),
            }
        }
    }
}
