//! # Timer registry
//!
//! The brain's timers are not real concurrent tasks, they are counters advanced once per tick by
//! [`TimerRegistry::advance`]. A one-shot timer counts down from its duration and expires when it
//! reaches zero, a repeating timer counts the ticks it has been active for until it is stopped.
//!
//! Starting a timer which is already active does nothing, which is what debounces the brain's
//! stoplight, node and rotation handling.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const NUM_TIMERS: usize = 5;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Fixed set of named timer slots.
#[derive(Debug, Clone)]
pub struct TimerRegistry {
    slots: [TimerSlot; NUM_TIMERS],
}

#[derive(Debug, Clone, Copy)]
struct TimerSlot {
    kind: TimerKind,

    active: bool,

    /// Ticks left before a one-shot expires.
    remaining: u32,

    /// Ticks the timer has been active for.
    elapsed: u32,

    /// Number of times the timer has expired.
    fire_count: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The named timers of the brain.
///
/// The declaration order is the order expired timers are reported in within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimerId {
    /// Stoplight dwell
    Cooldown,

    /// Bounded in-place search in the parking lot
    Spin,

    /// Settle delay at a graph node
    Node,

    /// Fixed duration turn pulse
    Rotate,

    /// Pulse used when departing the start node
    FirstNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Expires once after the given number of ticks.
    OneShot(u32),

    /// Never expires, counts elapsed ticks until stopped.
    Repeating,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TimerId {
    pub const ALL: [TimerId; NUM_TIMERS] = [
        TimerId::Cooldown,
        TimerId::Spin,
        TimerId::Node,
        TimerId::Rotate,
        TimerId::FirstNode,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl TimerSlot {
    fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            active: false,
            remaining: 0,
            elapsed: 0,
            fire_count: 0,
        }
    }
}

impl TimerRegistry {
    /// Create a registry where every timer is an inactive one-shot of a single tick.
    ///
    /// Use [`TimerRegistry::with_kind`] to set the real duration or behaviour of each timer.
    pub fn new() -> Self {
        Self {
            slots: [TimerSlot::new(TimerKind::OneShot(1)); NUM_TIMERS],
        }
    }

    /// Set the kind of the given timer.
    pub fn with_kind(mut self, id: TimerId, kind: TimerKind) -> Self {
        let kind = match kind {
            TimerKind::OneShot(0) => TimerKind::OneShot(1),
            k => k,
        };
        self.slots[id.index()] = TimerSlot::new(kind);
        self
    }

    /// Start the given timer.
    ///
    /// Returns `false` without touching the timer if it is already active.
    pub fn start(&mut self, id: TimerId) -> bool {
        let slot = &mut self.slots[id.index()];

        if slot.active {
            return false;
        }

        slot.active = true;
        slot.elapsed = 0;
        slot.remaining = match slot.kind {
            TimerKind::OneShot(d) => d,
            TimerKind::Repeating => 0,
        };

        debug!("Timer {:?} started", id);

        true
    }

    /// Stop the given timer without running its expiry.
    pub fn stop(&mut self, id: TimerId) {
        let slot = &mut self.slots[id.index()];

        if slot.active {
            debug!("Timer {:?} stopped after {} ticks", id, slot.elapsed);
        }

        slot.active = false;
        slot.remaining = 0;
        slot.elapsed = 0;
    }

    /// Deactivate every timer.
    pub fn stop_all(&mut self) {
        for id in TimerId::ALL.iter() {
            self.stop(*id);
        }
    }

    /// Advance every active timer by one tick.
    ///
    /// Returns the one-shot timers which expired on this tick. An expired timer is inactive by
    /// the time it is returned, so its expiry action may restart it.
    pub fn advance(&mut self) -> Vec<TimerId> {
        let mut expired = Vec::new();

        for id in TimerId::ALL.iter() {
            let slot = &mut self.slots[id.index()];

            if !slot.active {
                continue;
            }

            slot.elapsed = slot.elapsed.saturating_add(1);

            if let TimerKind::OneShot(_) = slot.kind {
                slot.remaining = slot.remaining.saturating_sub(1);

                if slot.remaining == 0 {
                    slot.active = false;
                    slot.elapsed = 0;
                    slot.fire_count = slot.fire_count.saturating_add(1);
                    debug!("Timer {:?} expired", id);
                    expired.push(*id);
                }
            }
        }

        expired
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.slots[id.index()].active
    }

    /// Number of ticks the timer has been active for, zero if inactive.
    pub fn elapsed_ticks(&self, id: TimerId) -> u32 {
        self.slots[id.index()].elapsed
    }

    /// Ticks left before the timer expires, zero for inactive or repeating timers.
    pub fn remaining_ticks(&self, id: TimerId) -> u32 {
        self.slots[id.index()].remaining
    }

    /// Number of times the timer has expired.
    pub fn fire_count(&self, id: TimerId) -> u32 {
        self.slots[id.index()].fire_count
    }

    pub fn has_fired(&self, id: TimerId) -> bool {
        self.fire_count(id) > 0
    }

    /// List of the currently active timers.
    pub fn active(&self) -> Vec<TimerId> {
        TimerId::ALL
            .iter()
            .copied()
            .filter(|id| self.is_active(*id))
            .collect()
    }
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
