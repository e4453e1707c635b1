//! Behavioural coverage for running handlers over PBF files.

use camino::{Utf8Path, Utf8PathBuf};
use mapflow_core::{CallbackHandler, DispatchError, HandlerRegistry, RunStats, Way};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs};
use tempfile::{Builder, TempPath};

use super::{PbfApplyError, apply_pbf};
use crate::test_support::{assert_close, write_fixture};
use crate::{LocationIndex, StreamSummary};

enum FixtureTarget {
    Existing(TempPath),
    Missing(Utf8PathBuf),
}

/// Handler state captured after a run, successful or not.
struct Observed {
    outcome: Result<RunStats, PbfApplyError>,
    summary: StreamSummary,
    index: LocationIndex,
    ways: Vec<Way>,
}

#[fixture]
fn target_fixture() -> RefCell<Option<FixtureTarget>> {
    RefCell::new(None)
}

#[fixture]
fn observed() -> RefCell<Option<Observed>> {
    RefCell::new(None)
}

fn utf8(path: &TempPath) -> &Utf8Path {
    Utf8Path::from_path(path).unwrap_or_else(|| panic!("temporary path {path:?} is not UTF-8"))
}

fn select(target: &RefCell<Option<FixtureTarget>>, stem: &str) {
    let fixture = Builder::new()
        .prefix(stem)
        .suffix(".osm.pbf")
        .tempfile()
        .expect("create temporary fixture")
        .into_temp_path();
    write_fixture(utf8(&fixture), stem).expect("write fixture");
    *target.borrow_mut() = Some(FixtureTarget::Existing(fixture));
}

#[given("the triangle PBF fixture")]
fn triangle_dataset(#[from(target_fixture)] target: &RefCell<Option<FixtureTarget>>) {
    select(target, "triangle");
}

#[given("the corrupt PBF fixture")]
fn corrupt_dataset(#[from(target_fixture)] target: &RefCell<Option<FixtureTarget>>) {
    select(target, "corrupt");
}

#[given("a path to a missing PBF file")]
fn missing_dataset(#[from(target_fixture)] target: &RefCell<Option<FixtureTarget>>) {
    *target.borrow_mut() = Some(FixtureTarget::Missing(
        Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/missing.osm.pbf"),
    ));
}

#[when("the summary and location index run over it")]
fn run_handlers(
    #[from(target_fixture)] target: &RefCell<Option<FixtureTarget>>,
    #[from(observed)] observed: &RefCell<Option<Observed>>,
) {
    let guard = target.borrow();
    let path = match guard.as_ref().expect("target path prepared") {
        FixtureTarget::Existing(temp) => utf8(temp).to_path_buf(),
        FixtureTarget::Missing(path) => path.clone(),
    };
    let mut index = LocationIndex::new();
    let mut summary = StreamSummary::new();
    let mut ways = Vec::new();
    let outcome = {
        let collected = &mut ways;
        let mut collector = CallbackHandler::new()
            .with_name("way-collector")
            .on_way(move |way| {
                collected.push(way.clone());
                Ok(())
            });
        let mut registry = HandlerRegistry::new();
        registry.push_plain(&mut index).push_lifecycle(&mut summary);
        registry
            .register(&mut collector)
            .expect("callback handler exposes handle");
        apply_pbf(&path, &mut registry)
    };
    *observed.borrow_mut() = Some(Observed {
        outcome,
        summary,
        index,
        ways,
    });
}

fn with_observed<T>(observed: &RefCell<Option<Observed>>, check: impl FnOnce(&Observed) -> T) -> T {
    let guard = observed.borrow();
    check(guard.as_ref().expect("handlers were run"))
}

#[then("the run succeeds after {count} records")]
fn run_succeeds(#[from(observed)] observed: &RefCell<Option<Observed>>, count: u64) {
    with_observed(observed, |seen| {
        let stats = seen.outcome.as_ref().expect("expected a successful run");
        assert_eq!(stats.records, count);
        assert!(seen.summary.finished);
    });
}

#[then("the summary includes 3 nodes, 1 way and 1 relation")]
fn summary_counts(#[from(observed)] observed: &RefCell<Option<Observed>>) {
    with_observed(observed, |seen| {
        assert_eq!(seen.summary.nodes, 3, "expected three nodes");
        assert_eq!(seen.summary.ways, 1, "expected one way");
        assert_eq!(seen.summary.relations, 1, "expected one relation");
        assert_eq!(seen.index.len(), 3);
    });
}

#[then("the sections were entered as node, way, relation")]
fn section_order(#[from(observed)] observed: &RefCell<Option<Observed>>) {
    with_observed(observed, |seen| {
        let names: Vec<&str> = seen.summary.sections.iter().map(|kind| kind.as_str()).collect();
        assert_eq!(names, vec!["node", "way", "relation"]);
    });
}

#[then("the summary bounding box spans the sample coordinates")]
fn summary_bounds(#[from(observed)] observed: &RefCell<Option<Observed>>) {
    with_observed(observed, |seen| {
        let bounds = seen
            .summary
            .bounds
            .expect("sample data should produce a bounding box");
        assert_close(bounds.min().x, 11.625_644_689_43);
        assert_close(bounds.max().x, 11.631_019_269_15);
        assert_close(bounds.min().y, 52.119_899_105_67);
        assert_close(bounds.max().y, 52.122_403_156_16);
    });
}

#[then("way {id} resolves to a closed line of {points} points")]
fn way_geometry(#[from(observed)] observed: &RefCell<Option<Observed>>, id: i64, points: usize) {
    with_observed(observed, |seen| {
        let way = seen
            .ways
            .iter()
            .find(|way| way.id == id)
            .expect("way was collected");
        let line = seen.index.way_line(way).expect("all nodes are located");
        assert_eq!(line.0.len(), points);
        assert!(line.is_closed());
    });
}

#[then("an open error is returned")]
fn open_error(#[from(observed)] observed: &RefCell<Option<Observed>>) {
    with_observed(observed, |seen| match &seen.outcome {
        Err(PbfApplyError::Open { path, .. }) => {
            assert!(
                path.as_str().ends_with("missing.osm.pbf"),
                "unexpected path in error: {path}"
            );
            assert!(!seen.summary.finished, "no handler should have run");
        }
        other => panic!("expected an open error, got {other:?}"),
    });
}

#[then("a malformed record error is reported at position {position}")]
fn malformed_error(#[from(observed)] observed: &RefCell<Option<Observed>>, position: u64) {
    with_observed(observed, |seen| match &seen.outcome {
        Err(PbfApplyError::Dispatch(DispatchError::MalformedRecord {
            position: reported,
            ..
        })) => assert_eq!(*reported, position),
        other => panic!("expected a malformed record error, got {other:?}"),
    });
}

#[then("the summary saw {count} nodes before the failure")]
fn partial_summary(#[from(observed)] observed: &RefCell<Option<Observed>>, count: u64) {
    with_observed(observed, |seen| {
        assert_eq!(seen.summary.nodes, count);
        assert!(!seen.summary.finished, "done must not follow a failure");
    });
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/features/pbf.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        vec![
            "summarising a known dataset",
            "resolving way geometry from indexed nodes",
            "reporting a missing file",
            "stopping at a corrupted blob",
        ]
    );
}

#[scenario(path = "tests/features/pbf.feature", index = 0)]
fn summarising_known_dataset(
    target_fixture: RefCell<Option<FixtureTarget>>,
    observed: RefCell<Option<Observed>>,
) {
    let _ = (target_fixture, observed);
}

#[scenario(path = "tests/features/pbf.feature", index = 1)]
fn resolving_way_geometry(
    target_fixture: RefCell<Option<FixtureTarget>>,
    observed: RefCell<Option<Observed>>,
) {
    let _ = (target_fixture, observed);
}

#[scenario(path = "tests/features/pbf.feature", index = 2)]
fn reporting_missing_files(
    target_fixture: RefCell<Option<FixtureTarget>>,
    observed: RefCell<Option<Observed>>,
) {
    let _ = (target_fixture, observed);
}

#[scenario(path = "tests/features/pbf.feature", index = 3)]
fn stopping_at_corrupt_blobs(
    target_fixture: RefCell<Option<FixtureTarget>>,
    observed: RefCell<Option<Observed>>,
) {
    let _ = (target_fixture, observed);
}
