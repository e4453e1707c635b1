//! The kind transition table.

use std::fmt;

use crate::{HandlerError, Kind, LifecycleHandler, Stage};

/// A change of kind between two consecutive stream positions.
///
/// Either side may be [`Kind::Undefined`], which stands for the boundary
/// before the first record or after the last one.
///
/// # Examples
///
/// ```
/// use mapflow_core::{Kind, Transition, TransitionCall};
///
/// assert!(Transition::between(Kind::Node, Kind::Node).is_none());
///
/// let opening = Transition::between(Kind::Undefined, Kind::Way).expect("kinds differ");
/// assert_eq!(opening.calls(), [TransitionCall::Init, TransitionCall::Before(Kind::Way)]);
///
/// let empty = Transition::closing(Kind::Undefined);
/// assert_eq!(empty.calls(), [TransitionCall::Init, TransitionCall::Done]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    from: Kind,
    to: Kind,
}

impl Transition {
    /// The transition from `last` to `current`, or `None` when they match.
    #[must_use]
    pub fn between(last: Kind, current: Kind) -> Option<Self> {
        (last != current).then_some(Self {
            from: last,
            to: current,
        })
    }

    /// The end-of-stream transition out of `last`.
    ///
    /// Unlike [`Transition::between`] this always yields a transition; for an
    /// empty stream it is `Undefined -> Undefined`.
    #[must_use]
    pub const fn closing(last: Kind) -> Self {
        Self {
            from: last,
            to: Kind::Undefined,
        }
    }

    /// Kind being left.
    #[must_use]
    pub const fn from_kind(self) -> Kind {
        self.from
    }

    /// Kind being entered.
    #[must_use]
    pub const fn to_kind(self) -> Kind {
        self.to
    }

    /// Call closing the old section: `init` when leaving the start boundary.
    #[must_use]
    pub const fn leave(self) -> TransitionCall {
        match self.from {
            Kind::Undefined => TransitionCall::Init,
            kind => TransitionCall::After(kind),
        }
    }

    /// Call opening the new section: `done` when entering the end boundary.
    #[must_use]
    pub const fn enter(self) -> TransitionCall {
        match self.to {
            Kind::Undefined => TransitionCall::Done,
            kind => TransitionCall::Before(kind),
        }
    }

    /// Both calls, in the order each lifecycle handler receives them.
    #[must_use]
    pub const fn calls(self) -> [TransitionCall; 2] {
        [self.leave(), self.enter()]
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// One lifecycle callback owed to a handler during a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionCall {
    /// `init()`.
    Init,
    /// `after(kind)`.
    After(Kind),
    /// `before(kind)`.
    Before(Kind),
    /// `done()`.
    Done,
}

impl TransitionCall {
    /// Perform the call on `handler`.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler's callback returns.
    pub fn invoke(self, handler: &mut dyn LifecycleHandler) -> Result<(), HandlerError> {
        match self {
            Self::Init => handler.init(),
            Self::After(kind) => handler.after(kind),
            Self::Before(kind) => handler.before(kind),
            Self::Done => handler.done(),
        }
    }

    /// The stage reported if the call fails.
    #[must_use]
    pub const fn stage(self) -> Stage {
        match self {
            Self::Init => Stage::Init,
            Self::After(kind) => Stage::After(kind),
            Self::Before(kind) => Stage::Before(kind),
            Self::Done => Stage::Done,
        }
    }
}
