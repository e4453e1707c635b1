//! Closure-backed handler assembled at runtime.

use std::fmt;

use crate::{
    Area, Changeset, Entity, Handler, HandlerError, HandlerObject, Hooks, Kind, LifecycleHandler,
    Node, Relation, Way,
};

type RecordCallback<'a, T> = Box<dyn FnMut(&T) -> Result<(), HandlerError> + 'a>;
type KindCallback<'a> = Box<dyn FnMut(Kind) -> Result<(), HandlerError> + 'a>;
type EventCallback<'a> = Box<dyn FnMut() -> Result<(), HandlerError> + 'a>;

/// A handler built from optional callbacks.
///
/// Its capability depends on which callbacks are set, so it registers through
/// [`crate::HandlerRegistry::register`]. Setting only record callbacks gives
/// a plain handler; adding all four transition callbacks gives a lifecycle
/// handler. Records of a kind without a callback are ignored.
///
/// # Examples
///
/// ```
/// use mapflow_core::{CallbackHandler, Capability, HandlerObject};
///
/// let mut ways = Vec::new();
/// let handler = CallbackHandler::new().with_name("ways").on_way(|way| {
///     ways.push(way.id);
///     Ok(())
/// });
/// assert_eq!(Capability::resolve(handler.hooks()), Ok(Capability::Plain));
/// ```
pub struct CallbackHandler<'a> {
    name: String,
    node: Option<RecordCallback<'a, Node>>,
    way: Option<RecordCallback<'a, Way>>,
    relation: Option<RecordCallback<'a, Relation>>,
    area: Option<RecordCallback<'a, Area>>,
    changeset: Option<RecordCallback<'a, Changeset>>,
    init: Option<EventCallback<'a>>,
    before: Option<KindCallback<'a>>,
    after: Option<KindCallback<'a>>,
    done: Option<EventCallback<'a>>,
}

impl Default for CallbackHandler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CallbackHandler<'a> {
    /// A handler with no callbacks, named `callback`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: String::from("callback"),
            node: None,
            way: None,
            relation: None,
            area: None,
            changeset: None,
            init: None,
            before: None,
            after: None,
            done: None,
        }
    }

    /// Name reported in logs and errors.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Called for every node.
    #[must_use]
    pub fn on_node(mut self, callback: impl FnMut(&Node) -> Result<(), HandlerError> + 'a) -> Self {
        self.node = Some(Box::new(callback));
        self
    }

    /// Called for every way.
    #[must_use]
    pub fn on_way(mut self, callback: impl FnMut(&Way) -> Result<(), HandlerError> + 'a) -> Self {
        self.way = Some(Box::new(callback));
        self
    }

    /// Called for every relation.
    #[must_use]
    pub fn on_relation(
        mut self,
        callback: impl FnMut(&Relation) -> Result<(), HandlerError> + 'a,
    ) -> Self {
        self.relation = Some(Box::new(callback));
        self
    }

    /// Called for every area.
    #[must_use]
    pub fn on_area(mut self, callback: impl FnMut(&Area) -> Result<(), HandlerError> + 'a) -> Self {
        self.area = Some(Box::new(callback));
        self
    }

    /// Called for every changeset.
    #[must_use]
    pub fn on_changeset(
        mut self,
        callback: impl FnMut(&Changeset) -> Result<(), HandlerError> + 'a,
    ) -> Self {
        self.changeset = Some(Box::new(callback));
        self
    }

    /// Called once when the run starts.
    #[must_use]
    pub fn on_init(mut self, callback: impl FnMut() -> Result<(), HandlerError> + 'a) -> Self {
        self.init = Some(Box::new(callback));
        self
    }

    /// Called when a section of records starts.
    #[must_use]
    pub fn on_before(mut self, callback: impl FnMut(Kind) -> Result<(), HandlerError> + 'a) -> Self {
        self.before = Some(Box::new(callback));
        self
    }

    /// Called when a section of records ends.
    #[must_use]
    pub fn on_after(mut self, callback: impl FnMut(Kind) -> Result<(), HandlerError> + 'a) -> Self {
        self.after = Some(Box::new(callback));
        self
    }

    /// Called once when the run ends.
    #[must_use]
    pub fn on_done(mut self, callback: impl FnMut() -> Result<(), HandlerError> + 'a) -> Self {
        self.done = Some(Box::new(callback));
        self
    }
}

fn call<T>(
    callback: Option<&mut RecordCallback<'_, T>>,
    record: &T,
) -> Result<(), HandlerError> {
    callback.map_or(Ok(()), |callback| callback(record))
}

impl Handler for CallbackHandler<'_> {
    fn handle(&mut self, entity: &Entity) -> Result<(), HandlerError> {
        match entity {
            Entity::Node(node) => call(self.node.as_mut(), node),
            Entity::Way(way) => call(self.way.as_mut(), way),
            Entity::Relation(relation) => call(self.relation.as_mut(), relation),
            Entity::Area(area) => call(self.area.as_mut(), area),
            Entity::Changeset(changeset) => call(self.changeset.as_mut(), changeset),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LifecycleHandler for CallbackHandler<'_> {
    fn init(&mut self) -> Result<(), HandlerError> {
        self.init.as_mut().map_or(Ok(()), |callback| callback())
    }

    fn before(&mut self, kind: Kind) -> Result<(), HandlerError> {
        self.before.as_mut().map_or(Ok(()), |callback| callback(kind))
    }

    fn after(&mut self, kind: Kind) -> Result<(), HandlerError> {
        self.after.as_mut().map_or(Ok(()), |callback| callback(kind))
    }

    fn done(&mut self) -> Result<(), HandlerError> {
        self.done.as_mut().map_or(Ok(()), |callback| callback())
    }
}

impl HandlerObject for CallbackHandler<'_> {
    fn hooks(&self) -> Hooks {
        Hooks {
            handle: self.node.is_some()
                || self.way.is_some()
                || self.relation.is_some()
                || self.area.is_some()
                || self.changeset.is_some(),
            init: self.init.is_some(),
            before: self.before.is_some(),
            after: self.after.is_some(),
            done: self.done.is_some(),
        }
    }
}

impl fmt::Debug for CallbackHandler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandler")
            .field("name", &self.name)
            .field("hooks", &self.hooks())
            .finish_non_exhaustive()
    }
}
