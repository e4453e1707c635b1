//! Test doubles for handlers and sources.
//!
//! [`RecordingHandler`] appends every call it receives to a shared
//! [`CallLog`], so a test can assert on the interleaving of several handlers
//! in one run. [`VecReader`] is an in-memory [`EntityReader`].

use std::{cell::RefCell, collections::VecDeque, fmt, rc::Rc};

use crate::{
    Entity, EntityReader, Handler, HandlerError, Kind, LifecycleHandler, Node, Relation,
    SourceError, Way,
};

/// A node without location or tags.
#[must_use]
pub const fn node(id: i64) -> Entity {
    Entity::Node(Node::new(id, None))
}

/// A way without references or tags.
#[must_use]
pub const fn way(id: i64) -> Entity {
    Entity::Way(Way::new(id, Vec::new()))
}

/// A relation without members or tags.
#[must_use]
pub const fn relation(id: i64) -> Entity {
    Entity::Relation(Relation::new(id, Vec::new()))
}

/// An [`EntityReader`] replaying a fixed list of outcomes.
///
/// Like a real reader it only reports exhaustion after a read has hit the
/// end, so an empty reader is accepted once and rejected afterwards.
#[derive(Debug, Default)]
pub struct VecReader {
    pending: VecDeque<Result<Entity, SourceError>>,
    exhausted: bool,
}

impl VecReader {
    /// Replay `entities` in order.
    pub fn new(entities: impl IntoIterator<Item = Entity>) -> Self {
        Self::from_results(entities.into_iter().map(Ok))
    }

    /// Replay successes and failures in order.
    pub fn from_results(results: impl IntoIterator<Item = Result<Entity, SourceError>>) -> Self {
        Self {
            pending: results.into_iter().collect(),
            exhausted: false,
        }
    }
}

impl EntityReader for VecReader {
    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn read_entity(&mut self) -> Result<Option<Entity>, SourceError> {
        match self.pending.pop_front() {
            Some(result) => result.map(Some),
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}

/// One call observed by a [`RecordingHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    /// `init()`.
    Init,
    /// `before(kind)`.
    Before(Kind),
    /// `handle(record)`, identified by record id.
    Handle(i64),
    /// `after(kind)`.
    After(Kind),
    /// `done()`.
    Done,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::Before(kind) => write!(f, "before({kind})"),
            Self::Handle(id) => write!(f, "handle({id})"),
            Self::After(kind) => write!(f, "after({kind})"),
            Self::Done => f.write_str("done"),
        }
    }
}

/// A call tagged with the handler that received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Name of the receiving handler.
    pub handler: String,
    /// The call.
    pub call: Call,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.handler, self.call)
    }
}

/// Shared, ordered log of calls across handlers.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Event>>>);

impl CallLog {
    /// Append one event.
    pub fn record(&self, handler: &str, call: Call) {
        self.0.borrow_mut().push(Event {
            handler: handler.to_owned(),
            call,
        });
    }

    /// Every event so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Events rendered as `handler:call`, for compact assertions.
    #[must_use]
    pub fn rendered(&self) -> Vec<String> {
        self.0.borrow().iter().map(ToString::to_string).collect()
    }

    /// Calls received by `handler`, in order.
    #[must_use]
    pub fn calls_for(&self, handler: &str) -> Vec<Call> {
        self.0
            .borrow()
            .iter()
            .filter(|event| event.handler == handler)
            .map(|event| event.call)
            .collect()
    }

    /// Number of events so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// A handler that logs every call and can fail on a chosen one.
///
/// It implements both capabilities; register it with
/// [`crate::HandlerRegistry::push_plain`] or
/// [`crate::HandlerRegistry::push_lifecycle`] to choose how it is driven.
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    name: String,
    log: CallLog,
    fail_on: Option<Call>,
}

impl RecordingHandler {
    /// A handler named `name` writing to `log`.
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            fail_on: None,
        }
    }

    /// Fail with a [`HandlerError`] when `call` is received.
    ///
    /// The failing call is still logged.
    #[must_use]
    pub fn failing_on(mut self, call: Call) -> Self {
        self.fail_on = Some(call);
        self
    }

    fn observe(&self, call: Call) -> Result<(), HandlerError> {
        self.log.record(&self.name, call);
        if self.fail_on == Some(call) {
            return Err(HandlerError::new(format!("{} refused {call}", self.name)));
        }
        Ok(())
    }
}

impl Handler for RecordingHandler {
    fn handle(&mut self, entity: &Entity) -> Result<(), HandlerError> {
        self.observe(Call::Handle(entity.id()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LifecycleHandler for RecordingHandler {
    fn init(&mut self) -> Result<(), HandlerError> {
        self.observe(Call::Init)
    }

    fn before(&mut self, kind: Kind) -> Result<(), HandlerError> {
        self.observe(Call::Before(kind))
    }

    fn after(&mut self, kind: Kind) -> Result<(), HandlerError> {
        self.observe(Call::After(kind))
    }

    fn done(&mut self) -> Result<(), HandlerError> {
        self.observe(Call::Done)
    }
}
