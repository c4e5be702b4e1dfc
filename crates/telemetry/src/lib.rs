//! Typed view over raw browser interaction telemetry.
//!
//! One [`model::RawEvent`] corresponds to one JSON record emitted by the
//! instrumented client. Several of its fields arrive double-encoded (a JSON
//! object serialized into a JSON string); [`payload`] owns the re-parsing of
//! those embedded bodies.

pub mod errors;
pub mod model;
pub mod payload;

pub use errors::{TelemetryError, TelemetryResult};
pub use model::{EventDetails, EventType, InteractionCategory, RawEvent};
pub use payload::{
    DomSnapshotPayload, ElementPayload, MetadataEntry, MutationAction, MutationNodePayload,
};
