//! Stream-level counts and extent.

use geo::{Coord, Rect};
use mapflow_core::{Entity, Handler, HandlerError, Kind, LifecycleHandler};
use serde::Serialize;

/// Lifecycle handler summarising a run.
///
/// Counts records per kind, tracks the bounding box of valid node
/// locations, and records the order in which sections were entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamSummary {
    /// Number of nodes.
    pub nodes: u64,
    /// Number of ways.
    pub ways: u64,
    /// Number of relations.
    pub relations: u64,
    /// Number of areas.
    pub areas: u64,
    /// Number of changesets.
    pub changesets: u64,
    /// Bounding box covering every located node, if any.
    /// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
    pub bounds: Option<Rect<f64>>,
    /// Kinds in the order their sections started.
    pub sections: Vec<Kind>,
    /// Whether `done()` has been observed.
    pub finished: bool,
}

impl StreamSummary {
    /// An empty summary.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: 0,
            ways: 0,
            relations: 0,
            areas: 0,
            changesets: 0,
            bounds: None,
            sections: Vec::new(),
            finished: false,
        }
    }

    /// Records counted for `kind`; always zero for [`Kind::Undefined`].
    #[must_use]
    pub const fn count(&self, kind: Kind) -> u64 {
        match kind {
            Kind::Undefined => 0,
            Kind::Node => self.nodes,
            Kind::Way => self.ways,
            Kind::Relation => self.relations,
            Kind::Area => self.areas,
            Kind::Changeset => self.changesets,
        }
    }

    /// Records counted across all kinds.
    #[must_use]
    pub fn total(&self) -> u64 {
        Kind::REAL.iter().map(|kind| self.count(*kind)).sum()
    }

    fn include(&mut self, location: Coord<f64>) {
        match &mut self.bounds {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(location.x),
                    y: existing.min().y.min(location.y),
                };
                let max = Coord {
                    x: existing.max().x.max(location.x),
                    y: existing.max().y.max(location.y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.bounds = Some(Rect::new(location, location)),
        }
    }
}

impl Handler for StreamSummary {
    fn handle(&mut self, entity: &Entity) -> Result<(), HandlerError> {
        match entity {
            Entity::Node(node) => {
                self.nodes += 1;
                if let Some(location) = node.location {
                    self.include(location);
                }
            }
            Entity::Way(_) => self.ways += 1,
            Entity::Relation(_) => self.relations += 1,
            Entity::Area(_) => self.areas += 1,
            Entity::Changeset(_) => self.changesets += 1,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stream-summary"
    }
}

impl LifecycleHandler for StreamSummary {
    fn init(&mut self) -> Result<(), HandlerError> {
        if self.finished {
            return Err(HandlerError::new(
                "stream summary has already observed a complete run",
            ));
        }
        Ok(())
    }

    fn before(&mut self, kind: Kind) -> Result<(), HandlerError> {
        self.sections.push(kind);
        Ok(())
    }

    fn after(&mut self, _kind: Kind) -> Result<(), HandlerError> {
        Ok(())
    }

    fn done(&mut self) -> Result<(), HandlerError> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapflow_core::test_support::{VecReader, node, relation, way};
    use mapflow_core::{HandlerRegistry, Node, SequentialSource, apply};
    use rstest::rstest;

    fn located(id: i64, x: f64, y: f64) -> Entity {
        Entity::from(Node::new(id, Some(Coord { x, y })))
    }

    fn summarise(stream: Vec<Entity>) -> StreamSummary {
        let mut summary = StreamSummary::new();
        let mut registry = HandlerRegistry::new();
        registry.push_lifecycle(&mut summary);
        let mut source = SequentialSource::new(VecReader::new(stream)).expect("fresh reader");
        apply(&mut source, &mut registry).expect("run succeeds");
        drop(registry);
        summary
    }

    #[rstest]
    fn counts_records_and_sections() {
        let summary = summarise(vec![node(1), node(2), way(10), relation(20), way(11)]);
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.ways, 2);
        assert_eq!(summary.relations, 1);
        assert_eq!(summary.total(), 5);
        assert_eq!(
            summary.sections,
            vec![Kind::Node, Kind::Way, Kind::Relation, Kind::Way]
        );
        assert!(summary.finished);
    }

    #[rstest]
    fn bounds_cover_located_nodes_only() {
        let summary = summarise(vec![
            located(1, 11.5, 52.0),
            node(2),
            located(3, 11.75, 52.25),
        ]);
        let bounds = summary.bounds.expect("two located nodes");
        assert_eq!(bounds.min(), Coord { x: 11.5, y: 52.0 });
        assert_eq!(bounds.max(), Coord { x: 11.75, y: 52.25 });
    }

    #[rstest]
    fn empty_runs_finish_without_bounds() {
        let summary = summarise(Vec::new());
        assert!(summary.finished);
        assert!(summary.bounds.is_none());
        assert!(summary.sections.is_empty());
    }

    #[rstest]
    fn refuses_a_second_run() {
        let mut summary = summarise(vec![node(1)]);
        let err = summary.init().expect_err("summary already finished");
        assert!(err.message().contains("already observed"));
    }

    #[rstest]
    fn serializes_counts_and_sections() {
        let summary = summarise(vec![way(1)]);
        let json = serde_json::to_value(&summary).expect("serialize summary");
        assert_eq!(json["ways"], 1);
        assert_eq!(json["sections"], serde_json::json!(["way"]));
        assert_eq!(json["finished"], true);
    }
}
