//! The dispatch engine.
//!
//! One run pulls every record from a source, feeds it to each registered
//! handler in order and, whenever the record kind changes, tells lifecycle
//! handlers which section ended and which one starts. The only state carried
//! between steps is the kind of the previous record.

use log::{debug, trace, warn};

use crate::{
    Capability, DispatchError, Entity, EntitySource, HandlerError, HandlerRegistry, HandlerSlot,
    Kind, Stage,
};

mod transition;

pub use transition::{Transition, TransitionCall};

/// Counters accumulated over one successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RunStats {
    /// Records passed to the handlers.
    pub records: u64,
    /// Kind transitions observed, including the opening and closing ones.
    /// Counted even when no lifecycle handler is registered.
    pub transitions: u64,
}

/// Drive `source` through `registry` until it is exhausted.
///
/// For a stream `[n1, n2, w1]` and handlers `[lifecycle A, plain B]` the calls
/// are `A.init`, `A.before(node)`, `A.handle(n1)`, `B.handle(n1)`,
/// `A.handle(n2)`, `B.handle(n2)`, `A.after(node)`, `A.before(way)`,
/// `A.handle(w1)`, `B.handle(w1)`, `A.after(way)` and `A.done`.
///
/// # Errors
///
/// The first failure, from the source or from any handler operation, stops
/// the run at once and is returned unchanged. No later handler, record or
/// closing transition is invoked after it.
///
/// A source that has already been run to its end is refused with
/// [`DispatchError::AlreadyExhausted`] before any handler is called.
///
/// # Examples
///
/// ```
/// use mapflow_core::{CallbackHandler, Entity, HandlerRegistry, Node, RecordBuffer, apply};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let buffer = RecordBuffer::from_entities(&[Entity::from(Node::new(7, None))])?;
/// let mut ids = Vec::new();
/// let mut collect = CallbackHandler::new().on_node(|node| {
///     ids.push(node.id);
///     Ok(())
/// });
/// let mut registry = HandlerRegistry::new();
/// registry.register(&mut collect)?;
/// apply(&mut buffer.source(), &mut registry)?;
/// drop(registry);
/// drop(collect);
/// assert_eq!(ids, vec![7]);
/// # Ok(())
/// # }
/// ```
pub fn apply<S>(source: &mut S, registry: &mut HandlerRegistry<'_>) -> Result<(), DispatchError>
where
    S: EntitySource + ?Sized,
{
    apply_with_stats(source, registry).map(|_| ())
}

/// [`apply`], returning the run's counters.
///
/// # Errors
///
/// Same as [`apply`].
pub fn apply_with_stats<S>(
    source: &mut S,
    registry: &mut HandlerRegistry<'_>,
) -> Result<RunStats, DispatchError>
where
    S: EntitySource + ?Sized,
{
    debug!(
        "Starting dispatch run with {} plain and {} lifecycle handlers",
        registry.count(Capability::Plain),
        registry.count(Capability::Lifecycle)
    );
    let outcome = drive(source, registry);
    match &outcome {
        Ok(stats) => debug!(
            "Dispatch run finished after {} records and {} transitions",
            stats.records, stats.transitions
        ),
        Err(err) => warn!("Dispatch run aborted: {err}"),
    }
    outcome
}

fn drive<S>(source: &mut S, registry: &mut HandlerRegistry<'_>) -> Result<RunStats, DispatchError>
where
    S: EntitySource + ?Sized,
{
    source.begin()?;
    let mut stats = RunStats::default();
    let mut last_seen = Kind::Undefined;
    while let Some(entity) = source.next_entity()? {
        let current = entity.kind();
        if let Some(transition) = Transition::between(last_seen, current) {
            notify(registry, transition)?;
            stats.transitions += 1;
            last_seen = current;
        }
        dispatch_record(registry, entity)?;
        stats.records += 1;
    }
    notify(registry, Transition::closing(last_seen))?;
    stats.transitions += 1;
    Ok(stats)
}

fn notify(registry: &mut HandlerRegistry<'_>, transition: Transition) -> Result<(), DispatchError> {
    trace!("Notifying transition {transition}");
    for (position, slot) in registry.slots_mut().enumerate() {
        let HandlerSlot::Lifecycle(handler) = slot else {
            continue;
        };
        for call in transition.calls() {
            call.invoke(&mut **handler)
                .map_err(|source| failure(position, handler.name(), call.stage(), source))?;
        }
    }
    Ok(())
}

fn dispatch_record(
    registry: &mut HandlerRegistry<'_>,
    entity: &Entity,
) -> Result<(), DispatchError> {
    for (position, slot) in registry.slots_mut().enumerate() {
        slot.handle(entity).map_err(|source| {
            failure(position, slot.name(), Stage::Handle(entity.kind()), source)
        })?;
    }
    Ok(())
}

fn failure(position: usize, handler: &str, stage: Stage, source: HandlerError) -> DispatchError {
    DispatchError::HandlerFailure {
        position,
        handler: handler.to_owned(),
        stage,
        source,
    }
}

#[cfg(test)]
mod tests;
