//! # Line following states
//!
//! `OnPath` follows the painted lane until a stoplight is seen. The robot then alternates
//! through `Stopping` and `Stopped` on the cooldown timer, counting each completed stop. Once the
//! resume count is reached the robot goes back to following the lane, and at the lot count it
//! leaves the road for the parking lot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::drive::WheelCmd;
use log::debug;

use super::{timers::TimerId, BrainContext, BrainParams, BrainState, StepOutput};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

pub(super) fn on_path(params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    let honoured_stop = ctx.stop_count == 0 || ctx.stop_count == params.resume_stop_count;

    if ctx.poi.stoplight && honoured_stop {
        debug!("Stoplight honoured at stop count {}", ctx.stop_count);
        ctx.timers.start(TimerId::Cooldown);
        StepOutput::transition(BrainState::Stopping)
    }
    else {
        let cmd = ctx.drive_pid(ctx.signals.path);
        StepOutput::wheels(cmd)
    }
}

pub(super) fn stopping(_params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if ctx.timers.is_active(TimerId::Cooldown) {
        return StepOutput::none();
    }

    ctx.stop_count += 1;
    ctx.timers.start(TimerId::Cooldown);

    StepOutput::wheels(WheelCmd::stop()).then(BrainState::Stopped)
}

pub(super) fn stopped(params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if ctx.timers.is_active(TimerId::Cooldown) {
        return StepOutput::none();
    }

    ctx.stop_count += 1;

    if ctx.stop_count == params.resume_stop_count {
        StepOutput::transition(BrainState::OnPath)
    }
    else if ctx.stop_count == params.lot_stop_count {
        StepOutput::transition(BrainState::Cancer)
    }
    else {
        StepOutput::none()
    }
}
