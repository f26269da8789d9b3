//! # Turn classification

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{NodeId, RouteError, RoutePair};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Lookup of how the robot leaves a node for each pair of the road graph.
///
/// Each pair belongs to at most one class. Pairs not in the table are unclassified, which the
/// brain treats as the end of the route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnTable {
    table: HashMap<RoutePair, Turn>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    Left,
    Right,
    Forward,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TurnTable {
    /// Build the table from the three lists of pairs.
    ///
    /// Returns an error if a pair appears in more than one list.
    pub fn new(
        left: Vec<(NodeId, NodeId)>,
        right: Vec<(NodeId, NodeId)>,
        forward: Vec<(NodeId, NodeId)>,
    ) -> Result<Self, RouteError> {
        let mut table = HashMap::new();

        let classes = vec![(Turn::Left, left), (Turn::Right, right), (Turn::Forward, forward)];

        for (turn, pairs) in classes {
            for pair in pairs.into_iter().map(RoutePair::from) {
                match table.insert(pair, turn) {
                    Some(existing) if existing != turn => {
                        return Err(RouteError::OverlappingTurn(pair, existing, turn))
                    }
                    _ => (),
                }
            }
        }

        Ok(Self { table })
    }

    /// Classify the given pair. The `None` pair (an exhausted route) is always unclassified.
    pub fn classify(&self, pair: Option<RoutePair>) -> Option<Turn> {
        pair.and_then(|p| self.table.get(&p).copied())
    }

    /// Returns true if the pair is classified as the given turn.
    pub fn is(&self, pair: Option<RoutePair>, turn: Turn) -> bool {
        self.classify(pair) == Some(turn)
    }

    /// Number of classified pairs.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn table() -> TurnTable {
        TurnTable::new(
            vec![(0, 1), (4, 2)],
            vec![(1, 3)],
            vec![(1, 2), (2, 5)],
        ).unwrap()
    }

    #[test]
    fn test_classify() {
        let t = table();

        assert_eq!(t.len(), 5);
        assert_eq!(t.classify(Some(RoutePair::new(0, 1))), Some(Turn::Left));
        assert_eq!(t.classify(Some(RoutePair::new(1, 3))), Some(Turn::Right));
        assert_eq!(t.classify(Some(RoutePair::new(2, 5))), Some(Turn::Forward));

        // Direction matters
        assert_eq!(t.classify(Some(RoutePair::new(1, 0))), None);

        // Exhausted route is unclassified
        assert_eq!(t.classify(None), None);

        assert!(t.is(Some(RoutePair::new(4, 2)), Turn::Left));
        assert!(!t.is(Some(RoutePair::new(4, 2)), Turn::Right));
    }

    #[test]
    fn test_overlap_rejected() {
        let res = TurnTable::new(vec![(0, 1)], vec![(0, 1)], vec![]);

        match res {
            Err(RouteError::OverlappingTurn(p, Turn::Left, Turn::Right)) => {
                assert_eq!(p, RoutePair::new(0, 1))
            }
            r => panic!("Expected an overlap error, got {:?}", r),
        }

        // Duplicates within one class are harmless
        assert!(TurnTable::new(vec![(0, 1), (0, 1)], vec![], vec![]).is_ok());
    }
}
