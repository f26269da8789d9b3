//! # Road graph states
//!
//! After leaving the lot the robot turns until the road is centred (`Graph`, `Orienting`) and
//! follows it (`GOnPath`). At each graph node it stops (`NodeStopping`, `NodeStopped`), takes the
//! next pair of the route and rotates according to the pair's turn class before following the
//! road out of the node (`RotateLeft`, `RotateRight`, `Forward`). An unclassified pair, or the end
//! of the route, finishes the run (`End`).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::drive::WheelCmd;
use log::{debug, info};

use crate::route::Turn;

use super::{timers::TimerId, BrainContext, BrainParams, BrainState, StepOutput};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

pub(super) fn graph(_params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    ctx.orient_baseline = ctx.signals.path;
    StepOutput::transition(BrainState::Orienting)
}

pub(super) fn orienting(params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    // Keep turning while the lane is still moving in view
    let moving = ctx.signals.path != ctx.orient_baseline;

    if moving {
        StepOutput::wheels(WheelCmd::spin(params.base_speed))
    }
    else {
        StepOutput::transition(BrainState::GOnPath)
    }
}

pub(super) fn g_on_path(_params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if ctx.poi.node {
        ctx.timers.start(TimerId::Node);
        StepOutput::transition(BrainState::NodeStopping)
    }
    else {
        let cmd = ctx.drive_pid(ctx.signals.path);
        StepOutput::wheels(cmd)
    }
}

pub(super) fn node_stopping(_params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if ctx.timers.is_active(TimerId::Node) {
        return StepOutput::none();
    }

    ctx.timers.start(TimerId::Node);

    StepOutput::wheels(WheelCmd::stop()).then(BrainState::NodeStopped)
}

pub(super) fn node_stopped(params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if ctx.timers.is_active(TimerId::Node) {
        return StepOutput::none();
    }

    ctx.current_pair = ctx.route.next();
    debug!(
        "Next route pair: {}",
        ctx.current_pair.map_or(String::from("none"), |p| p.to_string())
    );

    let mut out = StepOutput::none();

    let departing_start = matches!(ctx.current_pair, Some(p) if p.from == ctx.start_node);
    if departing_start && !ctx.timers.has_fired(TimerId::FirstNode) {
        ctx.timers.start(TimerId::FirstNode);
        out = StepOutput::wheels(WheelCmd::spin(params.base_speed));
    }

    ctx.timers.start(TimerId::Node);

    out.then(BrainState::RotateLeft)
}

pub(super) fn rotate_left(params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if !ctx.turn_table.is(ctx.current_pair, Turn::Left) {
        return StepOutput::transition(BrainState::RotateRight);
    }

    // The rotate timer's expiry moves the robot on to Forward
    if ctx.timers.start(TimerId::Rotate) {
        StepOutput::wheels(WheelCmd::spin(params.base_speed))
    }
    else {
        StepOutput::none()
    }
}

pub(super) fn rotate_right(params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if !ctx.turn_table.is(ctx.current_pair, Turn::Right) {
        return StepOutput::transition(BrainState::Forward);
    }

    if ctx.timers.start(TimerId::Rotate) {
        StepOutput::wheels(WheelCmd::spin(-params.base_speed))
    }
    else {
        StepOutput::none()
    }
}

pub(super) fn forward(_params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if ctx.turn_table.classify(ctx.current_pair).is_none() {
        return StepOutput::transition(BrainState::End);
    }

    if ctx.poi.node {
        ctx.timers.start(TimerId::Node);
        StepOutput::transition(BrainState::NodeStopping)
    }
    else {
        let cmd = ctx.drive_pid(ctx.signals.node);
        StepOutput::wheels(cmd)
    }
}

pub(super) fn end(_params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
    if !ctx.complete {
        info!("Route complete after {} pairs", ctx.route.len());
        ctx.complete = true;
    }

    StepOutput::none()
}
