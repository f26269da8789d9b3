//! # Parking lot states
//!
//! In the lot the robot advances straight (`Cancer`) until it meets an obstacle, then spins in
//! place (`Spin`) looking for the exit. If the spin runs for too long it gives up and turns
//! (`Turn`) in a random direction until the obstacle clears. Once the exit is visible the robot
//! moves to goal (`Mtg`) on the goal error, and when the exit leaves view it has left the lot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::drive::WheelCmd;
use log::info;

use super::{timers::TimerId, BrainContext, BrainParams, BrainState, StepOutput, TurnDir};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

pub(super) fn cancer(params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if ctx.poi.obstacle {
        StepOutput::transition(BrainState::Spin)
    }
    else if ctx.poi.exit {
        StepOutput::transition(BrainState::Mtg)
    }
    else {
        StepOutput::wheels(WheelCmd::straight(params.base_speed))
    }
}

pub(super) fn spin(params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    ctx.timers.start(TimerId::Spin);

    if ctx.timers.elapsed_ticks(TimerId::Spin) > params.spin_limit_ticks {
        let cmd = ctx.stop_spin(params);
        ctx.turn_dir = TurnDir::from_rng(ctx.rng.as_mut());

        info!("Spin limit reached, turning {:?}", ctx.turn_dir);

        StepOutput::wheels(cmd).then(BrainState::Turn)
    }
    else if !ctx.poi.obstacle && ctx.poi.exit {
        let cmd = ctx.stop_spin(params);
        StepOutput::wheels(cmd).then(BrainState::Mtg)
    }
    else {
        StepOutput::wheels(WheelCmd::spin(params.base_speed))
    }
}

pub(super) fn turn(params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if ctx.poi.obstacle {
        StepOutput::wheels(WheelCmd::spin(params.base_speed * ctx.turn_dir.sign()))
    }
    else {
        StepOutput::transition(BrainState::Cancer)
    }
}

pub(super) fn mtg(_params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if ctx.poi.exit {
        let cmd = ctx.drive_pid(ctx.signals.goal);
        StepOutput::wheels(cmd)
    }
    else {
        StepOutput::transition(BrainState::Graph)
    }
}
