//! Core dispatch engine for Mapflow entity pipelines.
//!
//! Responsibilities:
//! - Model the records flowing through a pipeline and their [`Kind`] tags.
//! - Define the two handler capability shapes ([`Handler`] and
//!   [`LifecycleHandler`]) and resolve opaque handlers into one of them.
//! - Abstract the two entity sources (sequential readers and pre-loaded
//!   buffers) behind [`EntitySource`].
//! - Drive a single pass over a source with [`apply`], notifying handlers of
//!   kind transitions and aborting on the first failure.
//!
//! Boundaries:
//! - File formats, geometry assembly and serialization live in collaborators
//!   (see `mapflow-data`); the engine only reads a record's kind.
//!
//! Invariants:
//! - Handlers are invoked in registration order for every record and every
//!   transition.
//! - One run holds no state beyond the last seen kind.

#![forbid(unsafe_code)]

mod buffer;
mod callback;
mod dispatch;
mod entity;
mod error;
mod handler;
mod kind;
mod pipeline;
mod registry;
mod source;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use buffer::{BufferSource, RecordBuffer};
pub use callback::CallbackHandler;
pub use dispatch::{RunStats, Transition, TransitionCall, apply, apply_with_stats};
pub use entity::{
    Area, AreaPolygon, Changeset, Entity, Member, MemberType, Node, Relation, Tags, Way,
};
pub use error::{BoxError, DispatchError, ErrorClass, HandlerError, Stage, UnsupportedReason};
pub use handler::{Handler, LifecycleHandler};
pub use kind::Kind;
pub use pipeline::Pipeline;
pub use registry::{Capability, HandlerObject, HandlerRegistry, HandlerSlot, Hooks};
pub use source::{EntityReader, EntitySource, SequentialSource, SourceError};
