//! # Route parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::{NodeId, RouteError, RoutePlan, TurnTable};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Road graph description, loaded from `route.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteParams {
    /// The node the robot departs from. Leaving this node uses the first-node pulse.
    pub start_node: NodeId,

    /// Node sequences for each reachable target.
    pub routes: Vec<TargetRoute>,

    /// Pairs on which the robot turns left.
    #[serde(default)]
    pub left: Vec<(NodeId, NodeId)>,

    /// Pairs on which the robot turns right.
    #[serde(default)]
    pub right: Vec<(NodeId, NodeId)>,

    /// Pairs on which the robot continues straight.
    #[serde(default)]
    pub forward: Vec<(NodeId, NodeId)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetRoute {
    pub target: NodeId,
    pub nodes: Vec<NodeId>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RouteParams {
    /// Get the route plan which leads to the given target.
    pub fn route_for(&self, target: NodeId) -> Result<RoutePlan, RouteError> {
        self.routes
            .iter()
            .find(|r| r.target == target)
            .map(|r| RoutePlan::new(r.nodes.clone()))
            .ok_or(RouteError::UnknownTarget(target))
    }

    /// Build the turn table from the pair lists.
    pub fn turn_table(&self) -> Result<TurnTable, RouteError> {
        TurnTable::new(self.left.clone(), self.right.clone(), self.forward.clone())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
