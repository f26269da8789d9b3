//! # Brain module
//!
//! This module implements the [`Brain`], the behaviour state machine of the robot. The robot
//! alternates between three driving regimes, each made up of a number of states:
//!
//! - Line following (`path.rs`) - `OnPath`, `Stopping`, `Stopped`. Follow the lane, stopping at
//!   stoplights.
//! - Parking lot (`lot.rs`) - `Cancer`, `Spin`, `Turn`, `Mtg`. Search the lot for its exit while
//!   avoiding the obstacle, then move to the exit.
//! - Road graph (`graph.rs`) - `Graph`, `Orienting`, `GOnPath`, `NodeStopping`, `NodeStopped`,
//!   `RotateLeft`, `RotateRight`, `Forward`, `End`. Follow the road, turning at each node as the
//!   route dictates.
//!
//! The brain is driven by [`Brain::tick`], which is called once per fixed period. Each tick first
//! advances the [`TimerRegistry`], running the expiry action of any timer which ran out, and then
//! steps the handler of the current state. Inputs from the vision pipeline are applied between
//! ticks with [`Brain::handle_input`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod graph;
mod lot;
mod params;
mod path;
pub mod timers;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use comms_if::{
    drive::{BrainMsg, StateBroadcast, WheelCmd},
    sensor::{PoiEvent, SensorMsg},
};
use log::{debug, info, trace};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    drive_ctrl::{DiffDriveCtrl, DriveCtrlError},
    route::{NodeId, RouteError, RouteParams, RoutePair, RoutePlan, TurnTable},
};
pub use params::{BrainParams, TimerParams};
pub use timers::{TimerId, TimerKind, TimerRegistry};
pub use tm::BrainTm;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Behaviour controller of the robot.
pub struct Brain {
    /// Parameters of the brain, fixed after initialisation.
    pub params: BrainParams,

    /// Everything the states read and modify.
    ctx: BrainContext,
}

/// The brain's context, exclusively owned by the [`Brain`] and handed to each state's handler.
pub struct BrainContext {
    /// The current state, changed only by [`Brain::transition`].
    pub state: BrainState,

    /// The latest error signals.
    pub signals: Signals,

    /// Point of interest flags.
    pub poi: PoiFlags,

    /// Number of completed stop cycles while line following.
    pub stop_count: u32,

    /// Direction to turn in when the spin gives up.
    pub turn_dir: TurnDir,

    /// Lane error recorded on entering the road graph.
    pub orient_baseline: f64,

    /// The route being followed.
    pub route: RoutePlan,

    /// Node the route departs from.
    pub start_node: NodeId,

    /// The route pair currently being traversed, `None` once the route is exhausted.
    pub current_pair: Option<RoutePair>,

    pub turn_table: TurnTable,

    pub timers: TimerRegistry,

    pub drive_ctrl: DiffDriveCtrl,

    /// Left and right wheel speeds tracked by the PID driven states.
    pub wheels: (f64, f64),

    /// Last wheel command emitted.
    pub last_wheels: Option<WheelCmd>,

    /// Source of the random turn direction.
    pub rng: Box<dyn RngCore + Send>,

    /// True once the first error signal has been received.
    pub bootstrapped: bool,

    /// True once the end of the route has been reached.
    pub complete: bool,

    /// Number of ticks processed.
    pub num_ticks: u64,
}

/// The three tracking error signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Signals {
    pub path: f64,
    pub goal: f64,
    pub node: f64,
}

/// Point of interest flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoiFlags {
    pub stoplight: bool,
    pub obstacle: bool,
    pub exit: bool,
    pub node: bool,
}

/// Data needed to initialise the brain from parameter files.
#[derive(Debug, Clone)]
pub struct BrainInitData {
    pub brain_params_path: String,
    pub drive_ctrl_params_path: String,
    pub route_params_path: String,

    /// Target node to drive to.
    pub target: NodeId,

    /// Seed which overrides the one in the brain parameters.
    pub seed: Option<u64>,
}

/// Output of a state's handler or of a timer's expiry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    /// Action to perform on the state
    pub action: StateAction,

    /// Wheel command to emit, emitted before any transition
    pub wheels: Option<WheelCmd>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur in the brain.
#[derive(Debug, thiserror::Error)]
pub enum BrainError {
    #[error("Failed to load BrainParams: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid brain parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to initialise the drive controller: {0}")]
    DriveCtrlError(DriveCtrlError),

    #[error("Route error: {0}")]
    RouteError(RouteError),
}

/// The states of the brain.
///
/// The numeric code broadcast on every transition is the position of the state in this list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrainState {
    OnPath,
    Stopping,
    Stopped,
    Cancer,
    Spin,
    Turn,
    Mtg,
    Graph,
    Orienting,
    GOnPath,
    NodeStopping,
    NodeStopped,
    RotateLeft,
    RotateRight,
    Forward,
    End,
}

/// Actions that can be performed on the state at the end of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    None,
    Transition(BrainState),
}

/// Direction of the in-place turn made when the spin gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnDir {
    /// Left wheel forwards, right wheel backwards
    Positive,

    /// Left wheel backwards, right wheel forwards
    Negative,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Brain {
    /// Create a new brain from its parts.
    pub fn new(
        params: BrainParams,
        drive_ctrl: DiffDriveCtrl,
        route: RoutePlan,
        start_node: NodeId,
        turn_table: TurnTable,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Self, BrainError> {
        params.validate()?;

        let ticks = |s: f64| util::time::seconds_to_ticks(s, params.tick_period_s);

        let timers = TimerRegistry::new()
            .with_kind(TimerId::Cooldown, TimerKind::OneShot(ticks(params.timers.cooldown_s)))
            .with_kind(TimerId::Spin, TimerKind::Repeating)
            .with_kind(TimerId::Node, TimerKind::OneShot(ticks(params.timers.node_s)))
            .with_kind(TimerId::Rotate, TimerKind::OneShot(ticks(params.timers.rotate_s)))
            .with_kind(
                TimerId::FirstNode,
                TimerKind::OneShot(ticks(params.timers.first_node_s)),
            );

        let ctx = BrainContext {
            state: params.initial_state,
            signals: Signals::default(),
            poi: PoiFlags::default(),
            stop_count: 0,
            turn_dir: TurnDir::Positive,
            orient_baseline: 0.0,
            route,
            start_node,
            current_pair: None,
            turn_table,
            timers,
            drive_ctrl,
            wheels: (params.base_speed, params.base_speed),
            last_wheels: None,
            rng,
            bootstrapped: false,
            complete: false,
            num_ticks: 0,
        };

        info!("Brain starting in {}", ctx.state);

        Ok(Self { params, ctx })
    }

    /// Load the brain, drive controller and route parameters and build the brain.
    pub fn init(init_data: &BrainInitData) -> Result<Self, BrainError> {
        let params: BrainParams = util::params::load(&init_data.brain_params_path)
            .map_err(BrainError::ParamLoadError)?;

        let drive_ctrl = DiffDriveCtrl::init(&init_data.drive_ctrl_params_path)
            .map_err(BrainError::DriveCtrlError)?;

        let route_params: RouteParams = util::params::load(&init_data.route_params_path)
            .map_err(|e| BrainError::RouteError(RouteError::ParamLoadError(e)))?;
        let route = route_params.route_for(init_data.target)
            .map_err(BrainError::RouteError)?;
        let turn_table = route_params.turn_table()
            .map_err(BrainError::RouteError)?;

        info!(
            "Route to node {} loaded: {:?} ({} pairs)",
            init_data.target,
            route.nodes(),
            route.len()
        );

        let rng: Box<dyn RngCore + Send> = match init_data.seed.or(params.seed) {
            Some(seed) => {
                info!("Turn direction source seeded with {}", seed);
                Box::new(StdRng::seed_from_u64(seed))
            }
            None => Box::new(StdRng::from_entropy()),
        };

        Self::new(params, drive_ctrl, route, route_params.start_node, turn_table, rng)
    }

    /// Apply an incoming sensor message.
    pub fn handle_input(&mut self, msg: SensorMsg) {
        let ctx = &mut self.ctx;

        match msg {
            SensorMsg::LaneError(e) => ctx.signals.path = e,
            SensorMsg::GoalError(e) => ctx.signals.goal = e,
            SensorMsg::NodeError(e) => ctx.signals.node = e,
            SensorMsg::Poi(poi) => match poi {
                PoiEvent::Stoplight => {
                    if ctx.state == BrainState::OnPath {
                        ctx.poi.stoplight = true;
                    }
                    else {
                        trace!("Stoplight ignored in {}", ctx.state);
                    }
                }
                PoiEvent::Obstacle => ctx.poi.obstacle = true,
                PoiEvent::NoObstacle => ctx.poi.obstacle = false,
                PoiEvent::ExitLot => ctx.poi.exit = true,
                PoiEvent::NoExitLot => ctx.poi.exit = false,
                PoiEvent::GraphNode => ctx.poi.node = true,
            },
        }

        if msg.is_error_signal() && !ctx.bootstrapped {
            debug!("First error signal received, brain started");
            ctx.bootstrapped = true;
        }
    }

    /// Execute one tick of the state machine.
    ///
    /// Returns every wheel command and state broadcast emitted during the tick, in order.
    pub fn tick(&mut self) -> Vec<BrainMsg> {
        let mut msgs = Vec::new();

        if self.params.wait_for_first_signal && !self.ctx.bootstrapped {
            return msgs;
        }

        self.ctx.num_ticks += 1;

        for id in self.ctx.timers.advance() {
            let out = self.ctx.timer_expired(id);
            self.apply(out, &mut msgs);
        }

        let state = self.ctx.state;
        let out = state.step(&self.params, &mut self.ctx);
        self.apply(out, &mut msgs);

        msgs
    }

    /// Apply the given inputs in order, then tick once.
    pub fn proc(&mut self, inputs: &[SensorMsg]) -> (Vec<BrainMsg>, BrainTm) {
        for msg in inputs {
            self.handle_input(*msg);
        }

        let msgs = self.tick();

        (msgs, self.tm())
    }

    /// Move to the given state, returning the state broadcast.
    pub fn transition(&mut self, state: BrainState) -> BrainMsg {
        info!("{} -> {}", self.ctx.state, state);
        self.ctx.state = state;

        BrainMsg::State(StateBroadcast { code: state.code() })
    }

    /// Stop every timer and bring the robot to a halt.
    pub fn shutdown(&mut self) -> Vec<BrainMsg> {
        info!("Brain shutting down in {}", self.ctx.state);

        self.ctx.timers.stop_all();

        let stop = WheelCmd::stop();
        self.ctx.last_wheels = Some(stop);

        vec![BrainMsg::Wheels(stop)]
    }

    /// Get the telemetry snapshot of the brain.
    pub fn tm(&self) -> BrainTm {
        let ctx = &self.ctx;

        BrainTm {
            state: ctx.state,
            state_code: ctx.state.code(),
            num_ticks: ctx.num_ticks,
            stop_count: ctx.stop_count,
            spin_ticks: ctx.timers.elapsed_ticks(TimerId::Spin),
            signals: ctx.signals,
            poi: ctx.poi,
            route_pair: ctx.current_pair,
            route_remaining: ctx.route.remaining(),
            last_wheels: ctx.last_wheels,
            pid_correction: ctx.drive_ctrl.correction(),
            active_timers: ctx.timers.active(),
            complete: ctx.complete,
        }
    }

    pub fn state(&self) -> BrainState {
        self.ctx.state
    }

    pub fn context(&self) -> &BrainContext {
        &self.ctx
    }

    pub fn is_complete(&self) -> bool {
        self.ctx.complete
    }

    fn apply(&mut self, out: StepOutput, msgs: &mut Vec<BrainMsg>) {
        if let Some(w) = out.wheels {
            self.ctx.last_wheels = Some(w);
            msgs.push(BrainMsg::Wheels(w));
        }

        if let StateAction::Transition(s) = out.action {
            msgs.push(self.transition(s));
        }
    }
}

impl BrainContext {
    /// Run the PID on the given error and update the tracked wheel speeds.
    pub fn drive_pid(&mut self, error: f64) -> WheelCmd {
        let (w1, w2) = self.drive_ctrl.calc_wheel_speeds(self.wheels.0, self.wheels.1, error);
        self.wheels = (w1, w2);

        WheelCmd::new(w1, w2)
    }

    /// Stop the spin timer, resetting the tracked wheel speeds to the base speed.
    ///
    /// Returns the zero wheel command which ends the spin.
    pub fn stop_spin(&mut self, params: &BrainParams) -> WheelCmd {
        self.timers.stop(TimerId::Spin);
        self.wheels = (params.base_speed, params.base_speed);

        WheelCmd::stop()
    }

    fn timer_expired(&mut self, id: TimerId) -> StepOutput {
        match id {
            TimerId::Cooldown => {
                self.poi.stoplight = false;
                StepOutput::none()
            }
            TimerId::Node => {
                self.poi.node = false;
                StepOutput::none()
            }
            TimerId::Rotate => StepOutput::transition(BrainState::Forward),
            TimerId::FirstNode => StepOutput::wheels(WheelCmd::stop()),
            // Repeating, stopped by the spin state itself
            TimerId::Spin => StepOutput::none(),
        }
    }
}

impl BrainState {
    pub const ALL: [BrainState; 16] = [
        BrainState::OnPath,
        BrainState::Stopping,
        BrainState::Stopped,
        BrainState::Cancer,
        BrainState::Spin,
        BrainState::Turn,
        BrainState::Mtg,
        BrainState::Graph,
        BrainState::Orienting,
        BrainState::GOnPath,
        BrainState::NodeStopping,
        BrainState::NodeStopped,
        BrainState::RotateLeft,
        BrainState::RotateRight,
        BrainState::Forward,
        BrainState::End,
    ];

    /// The numeric code broadcast for this state.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    fn step(self, params: &BrainParams, ctx: &mut BrainContext) -> StepOutput {
        match self {
            BrainState::OnPath => path::on_path(params, ctx),
            BrainState::Stopping => path::stopping(params, ctx),
            BrainState::Stopped => path::stopped(params, ctx),
            BrainState::Cancer => lot::cancer(params, ctx),
            BrainState::Spin => lot::spin(params, ctx),
            BrainState::Turn => lot::turn(params, ctx),
            BrainState::Mtg => lot::mtg(params, ctx),
            BrainState::Graph => graph::graph(params, ctx),
            BrainState::Orienting => graph::orienting(params, ctx),
            BrainState::GOnPath => graph::g_on_path(params, ctx),
            BrainState::NodeStopping => graph::node_stopping(params, ctx),
            BrainState::NodeStopped => graph::node_stopped(params, ctx),
            BrainState::RotateLeft => graph::rotate_left(params, ctx),
            BrainState::RotateRight => graph::rotate_right(params, ctx),
            BrainState::Forward => graph::forward(params, ctx),
            BrainState::End => graph::end(params, ctx),
        }
    }
}

impl Display for BrainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BrainState::{:?}", self)
    }
}

impl TurnDir {
    /// Pick a direction from the low bit of the next random number.
    pub fn from_rng(rng: &mut dyn RngCore) -> Self {
        match rng.next_u32() & 1 {
            1 => TurnDir::Positive,
            _ => TurnDir::Negative,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            TurnDir::Positive => 1.0,
            TurnDir::Negative => -1.0,
        }
    }
}

impl StepOutput {
    pub fn none() -> Self {
        Self {
            action: StateAction::None,
            wheels: None,
        }
    }

    pub fn transition(state: BrainState) -> Self {
        Self {
            action: StateAction::Transition(state),
            wheels: None,
        }
    }

    pub fn wheels(cmd: WheelCmd) -> Self {
        Self {
            action: StateAction::None,
            wheels: Some(cmd),
        }
    }

    /// Add a transition to this output.
    pub fn then(self, state: BrainState) -> Self {
        Self {
            action: StateAction::Transition(state),
            ..self
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl;
    use rand::{rngs::mock::StepRng, Rng};

    const BASE: f64 = 8.0;

    /// Short timers so the tests run through them quickly: cooldown 5 ticks, node 4 ticks,
    /// rotate 3 ticks, first node 2 ticks.
    fn params(initial_state: BrainState) -> BrainParams {
        BrainParams {
            initial_state,
            wait_for_first_signal: false,
            spin_limit_ticks: 10,
            timers: TimerParams {
                cooldown_s: 0.05,
                node_s: 0.04,
                rotate_s: 0.03,
                first_node_s: 0.02,
            },
            ..Default::default()
        }
    }

    fn brain_with(
        params: BrainParams,
        nodes: Vec<NodeId>,
        rng: Box<dyn RngCore + Send>,
    ) -> Brain {
        let table = TurnTable::new(vec![(0, 1)], vec![(1, 3)], vec![(1, 2)]).unwrap();

        Brain::new(
            params,
            DiffDriveCtrl::new(drive_ctrl::Params::default()).unwrap(),
            RoutePlan::new(nodes),
            0,
            table,
            rng,
        ).unwrap()
    }

    fn brain(state: BrainState) -> Brain {
        brain_with(params(state), vec![0, 1, 2], Box::new(StepRng::new(1, 0)))
    }

    fn poi(b: &mut Brain, event: PoiEvent) {
        b.handle_input(SensorMsg::Poi(event));
    }

    fn states(msgs: &[BrainMsg]) -> Vec<BrainState> {
        msgs.iter()
            .filter_map(|m| match m {
                BrainMsg::State(s) => BrainState::from_code(s.code),
                _ => None,
            })
            .collect()
    }

    fn wheels(msgs: &[BrainMsg]) -> Vec<WheelCmd> {
        msgs.iter()
            .filter_map(|m| match m {
                BrainMsg::Wheels(w) => Some(*w),
                _ => None,
            })
            .collect()
    }

    /// Tick until the brain is in the target state, returning every message emitted on the way.
    fn tick_until(b: &mut Brain, target: BrainState) -> Vec<BrainMsg> {
        let mut msgs = Vec::new();

        for _ in 0..100 {
            msgs.extend(b.tick());
            if b.state() == target {
                return msgs;
            }
        }

        panic!("{} not reached, stuck in {}", target, b.state());
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_state_codes() {
        for (i, s) in BrainState::ALL.iter().enumerate() {
            assert_eq!(s.code() as usize, i);
            assert_eq!(BrainState::from_code(s.code()), Some(*s));
        }
        assert_eq!(BrainState::OnPath.code(), 0);
        assert_eq!(BrainState::End.code(), 15);
        assert_eq!(BrainState::from_code(16), None);
    }

    #[test]
    fn test_transition_broadcasts() {
        let mut b = brain(BrainState::OnPath);

        let msg = b.transition(BrainState::Cancer);
        assert_eq!(msg, BrainMsg::State(StateBroadcast { code: 3 }));
        assert_eq!(b.state(), BrainState::Cancer);
    }

    #[test]
    fn test_waits_for_first_signal() {
        let mut b = brain_with(
            BrainParams {
                wait_for_first_signal: true,
                ..params(BrainState::OnPath)
            },
            vec![0, 1],
            Box::new(StepRng::new(0, 0)),
        );

        assert!(b.tick().is_empty());

        // Events alone do not start the brain
        poi(&mut b, PoiEvent::Obstacle);
        assert!(b.tick().is_empty());
        assert_eq!(b.tm().num_ticks, 0);

        b.handle_input(SensorMsg::LaneError(0.0));
        assert_eq!(wheels(&b.tick()).len(), 1);
    }

    #[test]
    fn test_scenario_a_straight_line() {
        let mut b = brain(BrainState::OnPath);
        b.handle_input(SensorMsg::LaneError(0.0));

        for _ in 0..100 {
            let msgs = b.tick();

            assert!(states(&msgs).is_empty());
            let w = wheels(&msgs);
            assert_eq!(w.len(), 1);
            assert!(approx(w[0].left, BASE));
            assert!(approx(w[0].right, BASE));
        }

        assert_eq!(b.state(), BrainState::OnPath);
        assert_eq!(b.context().drive_ctrl.correction(), 0.0);
    }

    #[test]
    fn test_on_path_steers() {
        let mut b = brain(BrainState::OnPath);
        b.handle_input(SensorMsg::LaneError(0.4));

        let w = wheels(&b.tick());
        assert!(w[0].left > w[0].right);
        assert!(approx((w[0].left + w[0].right) / 2.0, BASE));
    }

    #[test]
    fn test_scenario_b_stoplight_cycle() {
        let mut b = brain(BrainState::OnPath);
        poi(&mut b, PoiEvent::Stoplight);

        let msgs = b.tick();
        assert_eq!(states(&msgs), vec![BrainState::Stopping]);
        assert!(wheels(&msgs).is_empty());
        assert!(b.context().timers.is_active(TimerId::Cooldown));

        // Nothing happens while the cooldown runs
        for _ in 0..4 {
            assert!(b.tick().is_empty());
        }

        let msgs = b.tick();
        assert_eq!(
            msgs,
            vec![
                BrainMsg::Wheels(WheelCmd::stop()),
                BrainMsg::State(StateBroadcast { code: BrainState::Stopped.code() }),
            ]
        );
        assert_eq!(b.context().stop_count, 1);
        assert!(b.context().timers.is_active(TimerId::Cooldown));

        // Cooldown expiry cleared the stoplight
        assert!(!b.context().poi.stoplight);

        for _ in 0..4 {
            assert!(b.tick().is_empty());
        }

        assert_eq!(states(&b.tick()), vec![BrainState::OnPath]);
        assert_eq!(b.context().stop_count, 2);

        // Back to following the lane
        assert_eq!(wheels(&b.tick()).len(), 1);
        assert_eq!(b.state(), BrainState::OnPath);
    }

    #[test]
    fn test_second_stoplight_enters_lot() {
        let mut b = brain(BrainState::OnPath);

        poi(&mut b, PoiEvent::Stoplight);
        tick_until(&mut b, BrainState::Stopped);
        tick_until(&mut b, BrainState::OnPath);

        poi(&mut b, PoiEvent::Stoplight);
        assert_eq!(states(&b.tick()), vec![BrainState::Stopping]);
        tick_until(&mut b, BrainState::Stopped);
        assert_eq!(b.context().stop_count, 3);

        let msgs = tick_until(&mut b, BrainState::Cancer);
        assert_eq!(states(&msgs), vec![BrainState::Cancer]);
        assert_eq!(b.context().stop_count, 4);
    }

    #[test]
    fn test_wider_stop_counts_enter_lot() {
        let mut b = brain_with(
            BrainParams {
                resume_stop_count: 4,
                lot_stop_count: 6,
                ..params(BrainState::OnPath)
            },
            vec![0, 1, 2],
            Box::new(StepRng::new(1, 0)),
        );

        poi(&mut b, PoiEvent::Stoplight);
        tick_until(&mut b, BrainState::Stopped);
        tick_until(&mut b, BrainState::OnPath);
        assert_eq!(b.context().stop_count, 4);

        poi(&mut b, PoiEvent::Stoplight);
        tick_until(&mut b, BrainState::Stopped);
        assert_eq!(b.context().stop_count, 5);

        tick_until(&mut b, BrainState::Cancer);
        assert_eq!(b.context().stop_count, 6);
    }

    #[test]
    fn test_stop_counts_too_close_rejected() {
        for &(resume, lot) in [(2, 3), (1, 4)].iter() {
            let res = Brain::new(
                BrainParams {
                    resume_stop_count: resume,
                    lot_stop_count: lot,
                    ..Default::default()
                },
                DiffDriveCtrl::new(drive_ctrl::Params::default()).unwrap(),
                RoutePlan::new(vec![0, 1]),
                0,
                TurnTable::default(),
                Box::new(StepRng::new(0, 0)),
            );

            assert!(matches!(res, Err(BrainError::InvalidParams(_))));
        }
    }

    #[test]
    fn test_stoplight_only_honoured_on_path() {
        let mut b = brain(BrainState::Cancer);

        poi(&mut b, PoiEvent::Stoplight);
        assert!(!b.context().poi.stoplight);

        let msgs = b.tick();
        assert_eq!(wheels(&msgs), vec![WheelCmd::straight(BASE)]);
        assert!(states(&msgs).is_empty());
    }

    #[test]
    fn test_cancer() {
        let mut b = brain(BrainState::Cancer);
        assert_eq!(wheels(&b.tick()), vec![WheelCmd::straight(BASE)]);

        // The obstacle takes priority over the exit
        poi(&mut b, PoiEvent::ExitLot);
        poi(&mut b, PoiEvent::Obstacle);
        assert_eq!(states(&b.tick()), vec![BrainState::Spin]);

        let mut b = brain(BrainState::Cancer);
        poi(&mut b, PoiEvent::ExitLot);
        let msgs = b.tick();
        assert_eq!(states(&msgs), vec![BrainState::Mtg]);
        assert!(wheels(&msgs).is_empty());
    }

    #[test]
    fn test_scenario_d_spin_gives_up() {
        for (rng, dir) in vec![
            (StepRng::new(1, 0), TurnDir::Positive),
            (StepRng::new(0, 0), TurnDir::Negative),
        ] {
            let mut b = brain_with(params(BrainState::Spin), vec![0, 1], Box::new(rng));
            poi(&mut b, PoiEvent::Obstacle);

            // Spin until the tick counter passes the limit of 10
            for i in 0..11 {
                let msgs = b.tick();
                assert_eq!(msgs, vec![BrainMsg::Wheels(WheelCmd::spin(BASE))]);
                assert_eq!(b.tm().spin_ticks, i);
            }

            let msgs = b.tick();
            assert_eq!(wheels(&msgs), vec![WheelCmd::stop()]);
            assert_eq!(states(&msgs), vec![BrainState::Turn]);
            assert_eq!(b.context().turn_dir, dir);
            assert_eq!(b.tm().spin_ticks, 0);
            assert!(!b.context().timers.is_active(TimerId::Spin));

            // Turning in the chosen direction while the obstacle remains
            let msgs = b.tick();
            assert_eq!(wheels(&msgs), vec![WheelCmd::spin(BASE * dir.sign())]);

            poi(&mut b, PoiEvent::NoObstacle);
            assert_eq!(states(&b.tick()), vec![BrainState::Cancer]);
        }
    }

    #[test]
    fn test_spin_finds_exit() {
        let mut b = brain(BrainState::Spin);
        poi(&mut b, PoiEvent::Obstacle);

        for _ in 0..5 {
            b.tick();
        }

        // Still spinning while the obstacle is in view, even with the exit visible
        poi(&mut b, PoiEvent::ExitLot);
        assert_eq!(wheels(&b.tick()), vec![WheelCmd::spin(BASE)]);

        poi(&mut b, PoiEvent::NoObstacle);
        let msgs = b.tick();
        assert_eq!(wheels(&msgs), vec![WheelCmd::stop()]);
        assert_eq!(states(&msgs), vec![BrainState::Mtg]);
        assert_eq!(b.tm().spin_ticks, 0);
        assert_eq!(b.context().wheels, (BASE, BASE));
    }

    #[test]
    fn test_mtg() {
        let mut b = brain(BrainState::Mtg);
        poi(&mut b, PoiEvent::ExitLot);
        b.handle_input(SensorMsg::GoalError(-0.3));

        let w = wheels(&b.tick());
        assert_eq!(w.len(), 1);
        assert!(w[0].left < w[0].right);

        // Lane error is not used for moving to goal
        b.handle_input(SensorMsg::LaneError(0.9));
        b.handle_input(SensorMsg::GoalError(-0.3));
        let w = wheels(&b.tick());
        assert!(w[0].left < w[0].right);

        poi(&mut b, PoiEvent::NoExitLot);
        assert_eq!(states(&b.tick()), vec![BrainState::Graph]);
    }

    #[test]
    fn test_graph_and_orienting() {
        let mut b = brain(BrainState::Graph);
        b.handle_input(SensorMsg::LaneError(0.3));

        let msgs = b.tick();
        assert_eq!(msgs, vec![BrainMsg::State(StateBroadcast { code: 8 })]);
        assert_eq!(b.context().orient_baseline, 0.3);

        // Lane still moving, keep turning
        b.handle_input(SensorMsg::LaneError(0.1));
        assert_eq!(b.tick(), vec![BrainMsg::Wheels(WheelCmd::spin(BASE))]);
        assert_eq!(b.tick(), vec![BrainMsg::Wheels(WheelCmd::spin(BASE))]);

        b.handle_input(SensorMsg::LaneError(0.3));
        assert_eq!(states(&b.tick()), vec![BrainState::GOnPath]);
    }

    #[test]
    fn test_g_on_path_and_node_stop() {
        let mut b = brain(BrainState::GOnPath);
        b.handle_input(SensorMsg::LaneError(-0.2));

        let w = wheels(&b.tick());
        assert!(w[0].left < w[0].right);

        poi(&mut b, PoiEvent::GraphNode);
        assert_eq!(states(&b.tick()), vec![BrainState::NodeStopping]);
        assert!(b.context().timers.is_active(TimerId::Node));

        for _ in 0..3 {
            assert!(b.tick().is_empty());
        }

        let msgs = b.tick();
        assert_eq!(wheels(&msgs), vec![WheelCmd::stop()]);
        assert_eq!(states(&msgs), vec![BrainState::NodeStopped]);
        assert!(!b.context().poi.node);
        assert!(b.context().timers.is_active(TimerId::Node));
    }

    #[test]
    fn test_first_node_pulse() {
        let mut b = brain(BrainState::NodeStopped);

        let msgs = b.tick();
        assert_eq!(
            msgs,
            vec![
                BrainMsg::Wheels(WheelCmd::spin(BASE)),
                BrainMsg::State(StateBroadcast { code: BrainState::RotateLeft.code() }),
            ]
        );
        assert_eq!(b.context().current_pair, Some(RoutePair::new(0, 1)));
        assert!(b.context().timers.is_active(TimerId::FirstNode));
        assert!(b.context().timers.is_active(TimerId::Node));

        // Rotation starts, then the pulse ends
        assert_eq!(wheels(&b.tick()), vec![WheelCmd::spin(BASE)]);
        assert_eq!(wheels(&b.tick()), vec![WheelCmd::stop()]);
        assert!(b.context().timers.has_fired(TimerId::FirstNode));
    }

    #[test]
    fn test_unclassified_pair_skips_rotation() {
        let mut b = brain_with(
            params(BrainState::NodeStopped),
            vec![5, 6],
            Box::new(StepRng::new(0, 0)),
        );

        let mut msgs = b.tick();
        assert_eq!(states(&msgs), vec![BrainState::RotateLeft]);

        msgs.extend(b.tick());
        assert!(!b.context().timers.is_active(TimerId::Rotate));
        assert_eq!(b.state(), BrainState::RotateRight);

        msgs.extend(b.tick());
        assert!(!b.context().timers.is_active(TimerId::Rotate));
        assert_eq!(b.state(), BrainState::Forward);

        // No rotation was ever commanded
        assert!(wheels(&msgs).iter().all(|w| w.is_stop()));
        assert!(!b.context().timers.has_fired(TimerId::Rotate));

        assert_eq!(states(&b.tick()), vec![BrainState::End]);
    }

    #[test]
    fn test_rotate_right() {
        let mut b = brain_with(
            params(BrainState::NodeStopped),
            vec![1, 3],
            Box::new(StepRng::new(0, 0)),
        );

        tick_until(&mut b, BrainState::RotateRight);

        let msgs = b.tick();
        assert_eq!(msgs, vec![BrainMsg::Wheels(WheelCmd::new(-BASE, BASE))]);
        assert!(b.context().timers.is_active(TimerId::Rotate));

        // Pulse is emitted once, starting the timer again is a no-op
        assert!(b.tick().is_empty());
        assert!(b.tick().is_empty());

        // Timer expiry moves to Forward, which follows the road straight away
        let msgs = b.tick();
        assert_eq!(states(&msgs), vec![BrainState::Forward]);
        assert_eq!(wheels(&msgs).len(), 1);
        assert_eq!(b.state(), BrainState::Forward);
    }

    #[test]
    fn test_scenario_c_route_traversal() {
        let mut b = brain(BrainState::NodeStopped);

        // First pair (0, 1) is a left turn
        let msgs = tick_until(&mut b, BrainState::Forward);
        assert_eq!(states(&msgs), vec![BrainState::RotateLeft, BrainState::Forward]);
        assert!(b.context().timers.has_fired(TimerId::Rotate));

        // Follow the road out of the node
        b.handle_input(SensorMsg::NodeError(0.1));
        for _ in 0..5 {
            let msgs = b.tick();
            assert_eq!(wheels(&msgs).len(), 1);
            assert!(states(&msgs).is_empty());
        }

        // First full node stop cycle, (1, 2) is forward
        poi(&mut b, PoiEvent::GraphNode);
        assert_eq!(states(&b.tick()), vec![BrainState::NodeStopping]);
        tick_until(&mut b, BrainState::NodeStopped);
        let msgs = tick_until(&mut b, BrainState::Forward);
        assert_eq!(
            states(&msgs),
            vec![BrainState::RotateLeft, BrainState::RotateRight, BrainState::Forward]
        );
        assert_eq!(b.context().current_pair, Some(RoutePair::new(1, 2)));
        assert_eq!(b.context().timers.fire_count(TimerId::Rotate), 1);

        // Drive on until the node settle timer has run out
        for _ in 0..3 {
            assert_eq!(wheels(&b.tick()).len(), 1);
            assert_eq!(b.state(), BrainState::Forward);
        }

        // Second cycle exhausts the route
        poi(&mut b, PoiEvent::GraphNode);
        assert_eq!(states(&b.tick()), vec![BrainState::NodeStopping]);
        tick_until(&mut b, BrainState::NodeStopped);
        let msgs = tick_until(&mut b, BrainState::End);
        assert_eq!(
            states(&msgs),
            vec![
                BrainState::RotateLeft,
                BrainState::RotateRight,
                BrainState::Forward,
                BrainState::End,
            ]
        );
        assert_eq!(b.context().current_pair, None);

        // The start node pulse only ever fired once
        assert_eq!(b.context().timers.fire_count(TimerId::FirstNode), 1);

        assert!(!b.is_complete());
        assert!(b.tick().is_empty());
        assert!(b.is_complete());
        assert!(b.tick().is_empty());
        assert_eq!(b.state(), BrainState::End);
    }

    #[test]
    fn test_shutdown_stops_timers() {
        let mut b = brain(BrainState::OnPath);
        poi(&mut b, PoiEvent::Stoplight);
        b.tick();
        assert!(!b.context().timers.active().is_empty());

        assert_eq!(b.shutdown(), vec![BrainMsg::Wheels(WheelCmd::stop())]);
        assert!(b.context().timers.active().is_empty());
        assert_eq!(b.tm().last_wheels, Some(WheelCmd::stop()));
    }

    #[test]
    fn test_proc() {
        let mut b = brain(BrainState::OnPath);

        let (msgs, tm) = b.proc(&[
            SensorMsg::LaneError(0.5),
            SensorMsg::Poi(PoiEvent::Obstacle),
            SensorMsg::LaneError(0.0),
        ]);

        assert_eq!(wheels(&msgs).len(), 1);
        assert_eq!(tm.signals.path, 0.0);
        assert!(tm.poi.obstacle);
        assert_eq!(tm.state, BrainState::OnPath);
        assert_eq!(tm.state_code, 0);
        assert_eq!(tm.num_ticks, 1);
        assert_eq!(tm.route_remaining, 2);
    }

    #[test]
    fn test_invalid_params() {
        let res = Brain::new(
            BrainParams {
                resume_stop_count: 3,
                lot_stop_count: 2,
                ..Default::default()
            },
            DiffDriveCtrl::new(drive_ctrl::Params::default()).unwrap(),
            RoutePlan::new(vec![0, 1]),
            0,
            TurnTable::default(),
            Box::new(StepRng::new(0, 0)),
        );

        assert!(matches!(res, Err(BrainError::InvalidParams(_))));
    }

    /// Drive the brain with random inputs and check every transition is one the states allow.
    #[test]
    fn test_transitions_follow_table() {
        use BrainState::*;

        fn allowed(from: BrainState, to: BrainState) -> bool {
            matches!(
                (from, to),
                (OnPath, Stopping)
                    | (Stopping, Stopped)
                    | (Stopped, OnPath)
                    | (Stopped, Cancer)
                    | (Cancer, Spin)
                    | (Cancer, Mtg)
                    | (Spin, Turn)
                    | (Spin, Mtg)
                    | (Turn, Cancer)
                    | (Mtg, Graph)
                    | (Graph, Orienting)
                    | (Orienting, GOnPath)
                    | (GOnPath, NodeStopping)
                    | (NodeStopping, NodeStopped)
                    | (NodeStopped, RotateLeft)
                    | (RotateLeft, RotateRight)
                    | (RotateLeft, Forward)
                    | (RotateRight, Forward)
                    | (Forward, NodeStopping)
                    | (Forward, End)
            )
        }

        let mut inputs = rand::rngs::StdRng::seed_from_u64(11);

        for start in BrainState::ALL.iter() {
            let mut b = brain_with(
                params(*start),
                vec![0, 1, 2, 4, 2, 5, 7],
                Box::new(rand::rngs::StdRng::seed_from_u64(3)),
            );

            for _ in 0..2000 {
                if inputs.gen_bool(0.2) {
                    let msg = match inputs.gen_range(0..9) {
                        0 => SensorMsg::LaneError(inputs.gen_range(-1.0..1.0)),
                        1 => SensorMsg::LaneError(0.0),
                        2 => SensorMsg::GoalError(inputs.gen_range(-1.0..1.0)),
                        3 => SensorMsg::NodeError(inputs.gen_range(-1.0..1.0)),
                        4 => SensorMsg::Poi(PoiEvent::Stoplight),
                        5 => SensorMsg::Poi(PoiEvent::Obstacle),
                        6 => SensorMsg::Poi(PoiEvent::NoObstacle),
                        7 => SensorMsg::Poi(PoiEvent::ExitLot),
                        _ => SensorMsg::Poi(PoiEvent::GraphNode),
                    };
                    b.handle_input(msg);
                }
                if inputs.gen_bool(0.05) {
                    poi(&mut b, PoiEvent::NoExitLot);
                }

                let mut prev = b.state();
                for s in states(&b.tick()) {
                    assert!(allowed(prev, s), "{} -> {} is not allowed", prev, s);
                    prev = s;
                }
                assert_eq!(prev, b.state());
            }
        }
    }
}
