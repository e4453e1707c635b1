//! Handler registration and capability resolution.
//!
//! Statically typed handlers register with a known shape. Opaque handlers
//! implement [`HandlerObject`] and are classified from the hooks they report,
//! once, before any run starts.

use crate::{DispatchError, Entity, Handler, HandlerError, LifecycleHandler, UnsupportedReason};

/// The two handler shapes the engine dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Records only.
    Plain,
    /// Records plus transition callbacks.
    Lifecycle,
}

impl Capability {
    /// Classify a structural hook set.
    ///
    /// A lifecycle handler must expose every transition hook as well as
    /// `handle`; a partial transition set is rejected rather than silently
    /// downgraded to plain.
    ///
    /// # Errors
    ///
    /// Returns the [`UnsupportedReason`] when `hooks` fits neither shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapflow_core::{Capability, Hooks, UnsupportedReason};
    ///
    /// assert_eq!(Capability::resolve(Hooks::PLAIN), Ok(Capability::Plain));
    /// let partial = Hooks { done: false, ..Hooks::LIFECYCLE };
    /// assert_eq!(
    ///     Capability::resolve(partial),
    ///     Err(UnsupportedReason::PartialLifecycle)
    /// );
    /// ```
    pub const fn resolve(hooks: Hooks) -> Result<Self, UnsupportedReason> {
        match (hooks.handle, hooks.transition_count()) {
            (true, 0) => Ok(Self::Plain),
            (true, Hooks::TRANSITION_HOOKS) => Ok(Self::Lifecycle),
            (false, 0) => Err(UnsupportedReason::NoCapabilities),
            (false, Hooks::TRANSITION_HOOKS) => Err(UnsupportedReason::MissingHandle),
            _ => Err(UnsupportedReason::PartialLifecycle),
        }
    }
}

/// Operations an opaque handler reports as implemented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag mirrors one independently optional hook"
)]
pub struct Hooks {
    /// `handle(record)`.
    pub handle: bool,
    /// `init()`.
    pub init: bool,
    /// `before(kind)`.
    pub before: bool,
    /// `after(kind)`.
    pub after: bool,
    /// `done()`.
    pub done: bool,
}

impl Hooks {
    const TRANSITION_HOOKS: u8 = 4;

    /// No hooks at all.
    pub const NONE: Self = Self {
        handle: false,
        init: false,
        before: false,
        after: false,
        done: false,
    };

    /// Only `handle`.
    pub const PLAIN: Self = Self {
        handle: true,
        ..Self::NONE
    };

    /// `handle` and every transition hook.
    pub const LIFECYCLE: Self = Self {
        handle: true,
        init: true,
        before: true,
        after: true,
        done: true,
    };

    const fn transition_count(self) -> u8 {
        let mut count = 0;
        if self.init {
            count += 1;
        }
        if self.before {
            count += 1;
        }
        if self.after {
            count += 1;
        }
        if self.done {
            count += 1;
        }
        count
    }
}

/// A handler whose shape is only known at runtime.
///
/// The object implements every lifecycle operation (unused ones may be
/// no-ops) and reports which of them are real through [`HandlerObject::hooks`].
/// The answer must not change while the object is registered.
pub trait HandlerObject: LifecycleHandler {
    /// The hooks this object exposes.
    fn hooks(&self) -> Hooks;
}

/// A registered handler, tagged with its resolved capability.
pub enum HandlerSlot<'h> {
    /// Receives records only.
    Plain(&'h mut dyn Handler),
    /// Receives records and transition callbacks.
    Lifecycle(&'h mut dyn LifecycleHandler),
}

impl HandlerSlot<'_> {
    /// Capability of the slot.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        match self {
            Self::Plain(_) => Capability::Plain,
            Self::Lifecycle(_) => Capability::Lifecycle,
        }
    }

    /// Name reported by the handler.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(handler) => handler.name(),
            Self::Lifecycle(handler) => handler.name(),
        }
    }

    /// Pass one record to the handler, whatever its capability.
    ///
    /// # Errors
    ///
    /// Returns the handler's error unchanged.
    pub fn handle(&mut self, entity: &Entity) -> Result<(), HandlerError> {
        match self {
            Self::Plain(handler) => handler.handle(entity),
            Self::Lifecycle(handler) => handler.handle(entity),
        }
    }
}

impl std::fmt::Debug for HandlerSlot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSlot")
            .field("capability", &self.capability())
            .field("name", &self.name())
            .finish()
    }
}

/// Ordered set of handlers for one run.
///
/// Handlers are borrowed for `'h`; the registry never owns them, so callers
/// read their results back once the registry is dropped.
///
/// # Examples
///
/// ```
/// use mapflow_core::{Capability, CallbackHandler, HandlerRegistry};
///
/// # fn main() -> Result<(), mapflow_core::DispatchError> {
/// let mut nodes = 0;
/// let mut counter = CallbackHandler::new().on_node(|_| {
///     nodes += 1;
///     Ok(())
/// });
/// let mut registry = HandlerRegistry::new();
/// assert_eq!(registry.register(&mut counter)?, Capability::Plain);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct HandlerRegistry<'h> {
    slots: Vec<HandlerSlot<'h>>,
}

impl<'h> HandlerRegistry<'h> {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Resolve every object in `objects`, in order, before any run.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnsupportedHandler`] for the first object that
    /// fits neither capability.
    pub fn from_objects<I>(objects: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = &'h mut dyn HandlerObject>,
    {
        let mut registry = Self::new();
        for object in objects {
            registry.register(object)?;
        }
        Ok(registry)
    }

    /// Append a handler known to be plain.
    pub fn push_plain(&mut self, handler: &'h mut dyn Handler) -> &mut Self {
        self.slots.push(HandlerSlot::Plain(handler));
        self
    }

    /// Append a handler known to be lifecycle.
    pub fn push_lifecycle(&mut self, handler: &'h mut dyn LifecycleHandler) -> &mut Self {
        self.slots.push(HandlerSlot::Lifecycle(handler));
        self
    }

    /// Classify an opaque handler and append it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnsupportedHandler`] if the object's hooks fit
    /// neither capability; the registry is unchanged in that case.
    pub fn register(
        &mut self,
        object: &'h mut dyn HandlerObject,
    ) -> Result<Capability, DispatchError> {
        let position = self.slots.len();
        let capability =
            Capability::resolve(object.hooks()).map_err(|reason| DispatchError::UnsupportedHandler {
                position,
                handler: object.name().to_owned(),
                reason,
            })?;
        let slot = match capability {
            Capability::Plain => HandlerSlot::Plain(object),
            Capability::Lifecycle => HandlerSlot::Lifecycle(object),
        };
        self.slots.push(slot);
        Ok(capability)
    }

    /// Number of registered handlers.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when no handler is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Capabilities in registration order.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.slots.iter().map(HandlerSlot::capability)
    }

    /// Number of handlers registered with `capability`.
    #[must_use]
    pub fn count(&self, capability: Capability) -> usize {
        self.capabilities().filter(|found| *found == capability).count()
    }

    pub(crate) fn slots_mut(&mut self) -> std::slice::IterMut<'_, HandlerSlot<'h>> {
        self.slots.iter_mut()
    }
}
