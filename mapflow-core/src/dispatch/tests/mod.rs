//! Unit tests for the dispatch engine.

use std::io;

use super::*;
use crate::test_support::{Call, CallLog, RecordingHandler, VecReader, node, relation, way};
use crate::{
    BufferSource, EntityReader, ErrorClass, RecordBuffer, SequentialSource, SourceError,
};
use rstest::{fixture, rstest};


#[fixture]
fn log() -> CallLog {
    CallLog::default()
}

fn sequential(entities: impl IntoIterator<Item = Entity>) -> SequentialSource<VecReader> {
    SequentialSource::new(VecReader::new(entities)).expect("fresh reader")
}

#[rstest]
fn plain_handlers_see_every_record_and_no_transitions(log: CallLog) {
    let mut first = RecordingHandler::new("a", &log);
    let mut second = RecordingHandler::new("b", &log);
    let mut registry = HandlerRegistry::new();
    registry.push_plain(&mut first).push_plain(&mut second);

    let mut source = sequential([node(1), way(10), relation(20)]);
    let stats = apply_with_stats(&mut source, &mut registry).expect("run succeeds");

    assert_eq!(
        log.rendered(),
        vec![
            "a:handle(1)",
            "b:handle(1)",
            "a:handle(10)",
            "b:handle(10)",
            "a:handle(20)",
            "b:handle(20)",
        ]
    );
    assert_eq!(stats.records, 3);
    assert_eq!(stats.transitions, 4);
}

#[rstest]
fn mixed_handlers_follow_the_documented_sequence(log: CallLog) {
    let mut lifecycle = RecordingHandler::new("A", &log);
    let mut plain = RecordingHandler::new("B", &log);
    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut lifecycle).push_plain(&mut plain);

    apply(&mut sequential([node(1), node(2), way(10)]), &mut registry).expect("run succeeds");

    assert_eq!(
        log.rendered(),
        vec![
            "A:init",
            "A:before(node)",
            "A:handle(1)",
            "B:handle(1)",
            "A:handle(2)",
            "B:handle(2)",
            "A:after(node)",
            "A:before(way)",
            "A:handle(10)",
            "B:handle(10)",
            "A:after(way)",
            "A:done",
        ]
    );
}

#[rstest]
fn each_lifecycle_handler_completes_a_transition_before_the_next(log: CallLog) {
    let mut first = RecordingHandler::new("first", &log);
    let mut second = RecordingHandler::new("second", &log);
    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut first).push_lifecycle(&mut second);

    apply(&mut sequential([way(10)]), &mut registry).expect("run succeeds");

    assert_eq!(
        log.rendered(),
        vec![
            "first:init",
            "first:before(way)",
            "second:init",
            "second:before(way)",
            "first:handle(10)",
            "second:handle(10)",
            "first:after(way)",
            "first:done",
            "second:after(way)",
            "second:done",
        ]
    );
}

#[rstest]
fn empty_streams_only_open_and_close(log: CallLog) {
    let mut lifecycle = RecordingHandler::new("A", &log);
    let mut plain = RecordingHandler::new("B", &log);
    let mut registry = HandlerRegistry::new();
    registry.push_plain(&mut plain).push_lifecycle(&mut lifecycle);

    let stats =
        apply_with_stats(&mut BufferSource::new(b""), &mut registry).expect("run succeeds");

    assert_eq!(log.rendered(), vec!["A:init", "A:done"]);
    assert_eq!(stats, RunStats {
        records: 0,
        transitions: 1,
    });
}

#[rstest]
fn returning_kinds_open_a_new_section(log: CallLog) {
    let mut lifecycle = RecordingHandler::new("A", &log);
    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut lifecycle);

    apply(&mut sequential([node(1), way(10), node(2)]), &mut registry).expect("run succeeds");

    assert_eq!(
        log.calls_for("A"),
        vec![
            Call::Init,
            Call::Before(Kind::Node),
            Call::Handle(1),
            Call::After(Kind::Node),
            Call::Before(Kind::Way),
            Call::Handle(10),
            Call::After(Kind::Way),
            Call::Before(Kind::Node),
            Call::Handle(2),
            Call::After(Kind::Node),
            Call::Done,
        ]
    );
}

#[rstest]
fn handle_failures_stop_the_run_immediately(log: CallLog) {
    let mut first = RecordingHandler::new("first", &log).failing_on(Call::Handle(2));
    let mut second = RecordingHandler::new("second", &log);
    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut first).push_plain(&mut second);

    let err = apply(&mut sequential([node(1), node(2), node(3)]), &mut registry)
        .expect_err("second record fails");

    match &err {
        DispatchError::HandlerFailure {
            position,
            handler,
            stage,
            source,
        } => {
            assert_eq!(*position, 0);
            assert_eq!(handler, "first");
            assert_eq!(*stage, Stage::Handle(Kind::Node));
            assert_eq!(source.message(), "first refused handle(2)");
        }
        other => panic!("expected a handler failure, got {other:?}"),
    }
    assert_eq!(err.class(), ErrorClass::Handler);
    assert_eq!(
        log.rendered(),
        vec![
            "first:init",
            "first:before(node)",
            "first:handle(1)",
            "second:handle(1)",
            "first:handle(2)",
        ]
    );
}

#[rstest]
fn a_later_handler_failing_stops_before_the_next_record(log: CallLog) {
    let mut lifecycle = RecordingHandler::new("A", &log);
    let mut plain = RecordingHandler::new("B", &log).failing_on(Call::Handle(2));
    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut lifecycle).push_plain(&mut plain);

    let err = apply(&mut sequential([node(1), node(2), node(3)]), &mut registry)
        .expect_err("second record fails in B");

    assert!(
        matches!(
            &err,
            DispatchError::HandlerFailure {
                position: 1,
                stage: Stage::Handle(Kind::Node),
                handler,
                ..
            } if handler == "B"
        ),
        "unexpected error {err:?}"
    );
    assert_eq!(
        log.rendered(),
        vec![
            "A:init",
            "A:before(node)",
            "A:handle(1)",
            "B:handle(1)",
            "A:handle(2)",
            "B:handle(2)",
        ]
    );
}

#[rstest]
fn a_spent_source_cannot_be_run_again(log: CallLog) {
    let mut lifecycle = RecordingHandler::new("A", &log);
    let mut source = sequential([node(1)]);
    {
        let mut registry = HandlerRegistry::new();
        registry.push_lifecycle(&mut lifecycle);
        apply(&mut source, &mut registry).expect("first run succeeds");
    }
    let first_run = log.len();

    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut lifecycle);
    let err = apply(&mut source, &mut registry).expect_err("source is spent");

    assert!(matches!(err, DispatchError::AlreadyExhausted));
    assert_eq!(err.class(), ErrorClass::Argument);
    assert_eq!(log.len(), first_run, "no handler runs on a spent source");
}

#[rstest]
#[case(Call::Init, Stage::Init, 1)]
#[case(Call::Before(Kind::Node), Stage::Before(Kind::Node), 2)]
#[case(Call::After(Kind::Node), Stage::After(Kind::Node), 5)]
#[case(Call::Done, Stage::Done, 9)]
fn transition_failures_name_their_stage(
    log: CallLog,
    #[case] fail_on: Call,
    #[case] expected_stage: Stage,
    #[case] expected_calls: usize,
) {
    let mut failing = RecordingHandler::new("failing", &log).failing_on(fail_on);
    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut failing);

    let err = apply(&mut sequential([node(1), node(2), way(10)]), &mut registry)
        .expect_err("transition fails");

    assert!(
        matches!(err, DispatchError::HandlerFailure { stage, .. } if stage == expected_stage),
        "unexpected error {err:?}"
    );
    assert_eq!(log.len(), expected_calls, "calls: {:?}", log.rendered());
}

#[rstest]
fn closing_failures_skip_the_remaining_handlers(log: CallLog) {
    let mut first = RecordingHandler::new("first", &log).failing_on(Call::After(Kind::Way));
    let mut second = RecordingHandler::new("second", &log);
    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut first).push_lifecycle(&mut second);

    let err = apply(&mut sequential([way(10)]), &mut registry).expect_err("closing fails");

    assert!(matches!(
        err,
        DispatchError::HandlerFailure { position: 0, .. }
    ));
    assert!(log.calls_for("second").iter().all(|call| *call != Call::Done));
    assert!(log.calls_for("first").iter().all(|call| *call != Call::Done));
}

#[rstest]
fn source_failures_abort_without_closing(log: CallLog) {
    let mut lifecycle = RecordingHandler::new("A", &log);
    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut lifecycle);
    let reader = VecReader::from_results([
        Ok(node(1)),
        Err(SourceError::Read {
            source: io::Error::other("connection reset"),
        }),
    ]);
    let mut source = SequentialSource::new(reader).expect("fresh reader");

    let err = apply(&mut source, &mut registry).expect_err("read fails");

    assert!(matches!(err, DispatchError::Read { .. }));
    assert_eq!(err.class(), ErrorClass::Input);
    assert_eq!(
        log.rendered(),
        vec!["A:init", "A:before(node)", "A:handle(1)"]
    );
}

#[rstest]
fn malformed_buffer_records_surface_their_position(log: CallLog) {
    let mut plain = RecordingHandler::new("B", &log);
    let mut registry = HandlerRegistry::new();
    registry.push_plain(&mut plain);
    let mut buffer = RecordBuffer::new();
    buffer.push(&node(1)).expect("frame record");
    let mut bytes = buffer.into_bytes();
    bytes.extend_from_slice(b"{\"type\":\"node\"\n");

    let err = apply(&mut BufferSource::new(&bytes), &mut registry).expect_err("bad frame");

    assert!(matches!(
        err,
        DispatchError::MalformedRecord { position: 1, .. }
    ));
    assert_eq!(log.rendered(), vec!["B:handle(1)"]);
}

#[rstest]
fn buffer_and_sequential_sources_dispatch_identically() {
    let records = [node(1), node(2), way(10), relation(20)];
    let buffer = RecordBuffer::from_entities(&records).expect("frame records");

    let from_buffer = CallLog::default();
    let mut first = RecordingHandler::new("A", &from_buffer);
    let mut registry = HandlerRegistry::new();
    registry.push_lifecycle(&mut first);
    apply(&mut buffer.source(), &mut registry).expect("buffer run");

    let from_reader = CallLog::default();
    let mut second = RecordingHandler::new("A", &from_reader);
    let mut other = HandlerRegistry::new();
    other.push_lifecycle(&mut second);
    apply(&mut sequential(records), &mut other).expect("reader run");

    assert_eq!(from_buffer.events(), from_reader.events());
}

#[rstest]
fn runs_with_no_handlers_still_drain_the_source() {
    let mut registry = HandlerRegistry::new();
    let mut source = sequential([node(1), way(2)]);
    let stats = apply_with_stats(&mut source, &mut registry).expect("run succeeds");
    assert_eq!(stats.records, 2);
    assert!(source.get_ref().is_exhausted());
}
