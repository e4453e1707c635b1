//! Handler capability traits.

use crate::{Entity, HandlerError, Kind};

/// Plain capability: consumes dispatched records.
///
/// # Examples
///
/// ```
/// use mapflow_core::{Entity, Handler, HandlerError};
///
/// #[derive(Default)]
/// struct Counter(u64);
///
/// impl Handler for Counter {
///     fn handle(&mut self, _entity: &Entity) -> Result<(), HandlerError> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Handler {
    /// Process one record. The record is only valid for this call.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole run.
    fn handle(&mut self, entity: &Entity) -> Result<(), HandlerError>;

    /// Name used in logs and in [`crate::DispatchError::HandlerFailure`].
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Lifecycle capability: consumes records and ordered transition callbacks.
///
/// For a run over `[n1, n2, w1]` a lifecycle handler observes `init`,
/// `before(node)`, two `handle` calls, `after(node)`, `before(way)`,
/// `handle`, `after(way)` and finally `done`. An empty run observes only
/// `init` and `done`.
///
/// All four hooks are required; the `Kind` passed to `before` and `after` is
/// always a real kind.
pub trait LifecycleHandler: Handler {
    /// Called once, before anything else in the run.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole run.
    fn init(&mut self) -> Result<(), HandlerError>;

    /// Called when a run of records of `kind` starts.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole run.
    fn before(&mut self, kind: Kind) -> Result<(), HandlerError>;

    /// Called when a run of records of `kind` ends.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole run.
    fn after(&mut self, kind: Kind) -> Result<(), HandlerError>;

    /// Called once, after everything else in the run.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole run.
    fn done(&mut self) -> Result<(), HandlerError>;
}
