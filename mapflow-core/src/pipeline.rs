//! Single-call pipeline builder.

use std::fmt;

use crate::{
    DispatchError, EntitySource, Handler, HandlerObject, HandlerRegistry, LifecycleHandler,
    RunStats, apply_with_stats,
};

/// Collects a source and handlers, then runs them once.
///
/// Registration problems are held until [`Pipeline::run`] so the builder
/// chain stays infallible; nothing is read from the source when one is
/// pending.
///
/// # Examples
///
/// ```
/// use mapflow_core::{CallbackHandler, Entity, Node, Pipeline, RecordBuffer, Way};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let buffer = RecordBuffer::from_entities(&[
///     Entity::from(Node::new(1, None)),
///     Entity::from(Way::new(2, vec![1])),
/// ])?;
/// let mut source = buffer.source();
/// let mut sections = Vec::new();
/// let mut tracker = CallbackHandler::new()
///     .on_node(|_| Ok(()))
///     .on_way(|_| Ok(()))
///     .on_init(|| Ok(()))
///     .on_before(|kind| {
///         sections.push(kind);
///         Ok(())
///     })
///     .on_after(|_| Ok(()))
///     .on_done(|| Ok(()));
/// Pipeline::new()
///     .with_source(&mut source)
///     .with_object(&mut tracker)
///     .run()?;
/// drop(tracker);
/// assert_eq!(sections.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Pipeline<'h, 's> {
    source: Option<&'s mut dyn EntitySource>,
    registry: HandlerRegistry<'h>,
    pending: Option<DispatchError>,
}

impl<'h, 's> Pipeline<'h, 's> {
    /// An empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            registry: HandlerRegistry::new(),
            pending: None,
        }
    }

    /// Use `source`, replacing any previous one.
    #[must_use]
    pub fn with_source(mut self, source: &'s mut dyn EntitySource) -> Self {
        self.source = Some(source);
        self
    }

    /// Append a plain handler.
    #[must_use]
    pub fn with_plain(mut self, handler: &'h mut dyn Handler) -> Self {
        self.registry.push_plain(handler);
        self
    }

    /// Append a lifecycle handler.
    #[must_use]
    pub fn with_lifecycle(mut self, handler: &'h mut dyn LifecycleHandler) -> Self {
        self.registry.push_lifecycle(handler);
        self
    }

    /// Classify and append an opaque handler.
    ///
    /// If the object fits neither capability the error is kept for
    /// [`Pipeline::run`] and later objects are ignored.
    #[must_use]
    pub fn with_object(mut self, object: &'h mut dyn HandlerObject) -> Self {
        if self.pending.is_none()
            && let Err(err) = self.registry.register(object)
        {
            self.pending = Some(err);
        }
        self
    }

    /// The handlers registered so far.
    #[must_use]
    pub const fn registry(&self) -> &HandlerRegistry<'h> {
        &self.registry
    }

    /// Run the pipeline once.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] when no source was given,
    /// a held registration error, or the first failure of the run itself.
    pub fn run(self) -> Result<(), DispatchError> {
        self.run_with_stats().map(|_| ())
    }

    /// [`Pipeline::run`], returning the run's counters.
    ///
    /// # Errors
    ///
    /// Same as [`Pipeline::run`].
    pub fn run_with_stats(self) -> Result<RunStats, DispatchError> {
        let Self {
            source: supplied,
            mut registry,
            pending,
        } = self;
        let source = supplied.ok_or(DispatchError::InvalidArgument {
            reason: "no entity source was supplied",
        })?;
        if let Some(err) = pending {
            return Err(err);
        }
        apply_with_stats(source, &mut registry)
    }
}

impl fmt::Debug for Pipeline<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("has_source", &self.source.is_some())
            .field("registry", &self.registry)
            .field("pending", &self.pending)
            .finish()
    }
}
