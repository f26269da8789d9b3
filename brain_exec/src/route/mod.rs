//! # Route module
//!
//! A route is the fixed sequence of graph nodes the robot drives through to reach its target. The
//! sequence is stored once and consumed pair by pair, each [`RoutePair`] being one edge of the
//! road graph. How the robot leaves a node is decided by looking the pair up in the
//! [`TurnTable`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod turn_table;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub use params::{RouteParams, TargetRoute};
pub use turn_table::{Turn, TurnTable};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Identifier of a node in the road graph.
pub type NodeId = u32;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single step of a route, from one graph node to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutePair {
    pub from: NodeId,
    pub to: NodeId,
}

/// The plan of pairs to traverse for a chosen target.
///
/// Pair `i` is `(nodes[i], nodes[i + 1])`. The plan keeps the node sequence and a cursor, and
/// [`RoutePlan::next`] returns `None` once the last pair has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    nodes: Vec<NodeId>,

    /// Index of the `from` node of the next pair to be returned.
    cursor: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Could not load route parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("No route is defined for target node {0}")]
    UnknownTarget(NodeId),

    #[error("Route pair {0} is classified as both {1:?} and {2:?}")]
    OverlappingTurn(RoutePair, Turn, Turn),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoutePair {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}

impl From<(NodeId, NodeId)> for RoutePair {
    fn from(pair: (NodeId, NodeId)) -> Self {
        Self::new(pair.0, pair.1)
    }
}

impl Display for RoutePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.from, self.to)
    }
}

impl RoutePlan {
    /// Build a new plan from the flat sequence of nodes to visit.
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes, cursor: 0 }
    }

    /// Returns the next pair and advances the cursor, or `None` if the route is exhausted.
    pub fn next(&mut self) -> Option<RoutePair> {
        let pair = self.peek()?;
        self.cursor += 1;
        Some(pair)
    }

    /// Returns the next pair without advancing the cursor.
    pub fn peek(&self) -> Option<RoutePair> {
        match (self.nodes.get(self.cursor), self.nodes.get(self.cursor + 1)) {
            (Some(&from), Some(&to)) => Some(RoutePair::new(from, to)),
            _ => None,
        }
    }

    /// Number of pairs left to consume.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.cursor)
    }

    /// Total number of pairs in the plan.
    pub fn len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// The node sequence this plan was built from.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
