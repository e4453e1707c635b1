//! Facade crate for the Mapflow entity-stream dispatch engine.
//!
//! This crate re-exports the dispatch core and exposes the OSM PBF reader and
//! bundled handlers behind the `pbf` feature.

#![forbid(unsafe_code)]

pub use mapflow_core::{
    Area, AreaPolygon, BufferSource, CallbackHandler, Capability, Changeset, DispatchError,
    Entity, EntityReader, EntitySource, ErrorClass, Handler, HandlerError, HandlerObject,
    HandlerRegistry, Hooks, Kind, LifecycleHandler, Member, MemberType, Node, Pipeline,
    RecordBuffer, Relation, RunStats, SequentialSource, SourceError, Stage, Tags, Transition,
    UnsupportedReason, Way, apply, apply_with_stats,
};

#[cfg(feature = "pbf")]
pub use mapflow_data::{
    GeometryError, LocationIndex, MissingLocation, PbfApplyError, PbfReader, StreamSummary,
    apply_pbf, geometry, open_pbf,
};
