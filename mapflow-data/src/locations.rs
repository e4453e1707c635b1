//! Node location lookup for way geometry.

use std::collections::HashMap;

use geo::{Coord, LineString};
use mapflow_core::{Entity, Handler, HandlerError, Way};
use thiserror::Error;

/// A way referenced a node whose location was never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("way {way} references node {node} without a known location")]
pub struct MissingLocation {
    /// The way being assembled.
    pub way: i64,
    /// The unresolved node reference.
    pub node: i64,
}

/// Plain handler remembering every located node.
///
/// Nodes precede ways in PBF files, so registering the index ahead of a way
/// consumer lets that consumer build geometry during the same pass.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use mapflow_core::{Entity, Handler, Node, Way};
/// use mapflow_data::LocationIndex;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut index = LocationIndex::new();
/// index.handle(&Entity::from(Node::new(1, Some(Coord { x: 0.0, y: 0.0 }))))?;
/// index.handle(&Entity::from(Node::new(2, Some(Coord { x: 1.0, y: 1.0 }))))?;
/// let line = index.way_line(&Way::new(7, vec![1, 2]))?;
/// assert_eq!(line.0.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationIndex {
    locations: HashMap<i64, Coord<f64>>,
}

impl LocationIndex {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns `true` when no node has been indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Location of node `id`, if it was seen with one.
    #[must_use]
    pub fn location(&self, id: i64) -> Option<Coord<f64>> {
        self.locations.get(&id).copied()
    }

    /// Resolve `way` into a line through its nodes.
    ///
    /// # Errors
    ///
    /// Returns [`MissingLocation`] for the first reference without a known
    /// location.
    pub fn way_line(&self, way: &Way) -> Result<LineString<f64>, MissingLocation> {
        way.refs
            .iter()
            .map(|node| {
                self.location(*node).ok_or(MissingLocation {
                    way: way.id,
                    node: *node,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(LineString::new)
    }
}

impl Handler for LocationIndex {
    fn handle(&mut self, entity: &Entity) -> Result<(), HandlerError> {
        if let Entity::Node(node) = entity
            && let Some(location) = node.location
        {
            self.locations.insert(node.id, location);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "location-index"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapflow_core::Node;
    use mapflow_core::test_support::{node, way};
    use rstest::{fixture, rstest};

    #[fixture]
    fn index() -> LocationIndex {
        let mut index = LocationIndex::new();
        for (id, x, y) in [(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0)] {
            index
                .handle(&Entity::from(Node::new(id, Some(Coord { x, y }))))
                .expect("index node");
        }
        index
    }

    #[rstest]
    fn ignores_unlocated_nodes_and_other_kinds(mut index: LocationIndex) {
        index.handle(&node(4)).expect("unlocated node");
        index.handle(&way(10)).expect("way");
        assert_eq!(index.len(), 3);
        assert!(index.location(4).is_none());
    }

    #[rstest]
    fn builds_closed_lines(index: LocationIndex) {
        let line = index
            .way_line(&Way::new(10, vec![1, 2, 3, 1]))
            .expect("all nodes located");
        assert!(line.is_closed());
        assert_eq!(line.0.get(2), Some(&Coord { x: 1.0, y: 1.0 }));
    }

    #[rstest]
    fn reports_the_first_missing_reference(index: LocationIndex) {
        let err = index
            .way_line(&Way::new(11, vec![1, 9, 8]))
            .expect_err("node 9 is unknown");
        assert_eq!(err, MissingLocation { way: 11, node: 9 });
        assert_eq!(
            err.to_string(),
            "way 11 references node 9 without a known location"
        );
    }
}
