//! Semantic timeline construction.
//!
//! Reduces a noisy stream of raw browser interaction telemetry into a compact
//! ordered sequence of semantic entities: clicks, coalesced data entries, DOM
//! effect windows, synthetic location changes and write-traffic network calls.
//! The [`Stitcher`] consumes events one at a time (or as a batch via
//! [`Stitcher::parse`], which is behaviorally identical) and mutates a
//! [`Timeline`] in place, fail-soft per event: one malformed record never
//! aborts a session's reconstruction.

pub mod adapters;
pub mod basepath;
pub mod dispatch;
pub mod entity;
pub mod errors;
pub mod mappers;
pub mod model;
pub mod policy;
pub mod ports;
pub mod timeline;

pub use dispatch::Stitcher;
pub use entity::{
    ClickEntity, DataEntryEntity, EffectEntity, LocationChangeEntity, NetworkEntity,
    TimelineEntity,
};
pub use errors::{StitchError, StitchResult};
pub use model::{ClickUnit, DomMutationUnit, EditorKind, InputUnit, NetworkUnit};
pub use policy::{StitchPolicyHandle, StitchPolicyView};
pub use ports::ElementLocatorPort;
pub use timeline::Timeline;
