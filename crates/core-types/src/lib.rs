//! Shared identifier newtypes used across the sessionstitch crates.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one capture session as reported by the instrumented client.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one reconstructed timeline.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TimelineId(pub String);

impl TimelineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable reference to a DOM snapshot body.
///
/// Minted as a digest of the snapshot text rather than a random id so that
/// replaying the same event list yields identical entities.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SnapshotRef(pub String);

impl SnapshotRef {
    pub fn digest_of(body: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        body.hash(&mut hasher);
        Self(format!("snap-{:016x}", hasher.finish()))
    }
}

/// Opaque handle to an element resolved inside a snapshot by the locator port.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_ref_is_deterministic() {
        let a = SnapshotRef::digest_of("<html><body/></html>");
        let b = SnapshotRef::digest_of("<html><body/></html>");
        assert_eq!(a, b);
        assert_ne!(a, SnapshotRef::digest_of("<html></html>"));
    }

    #[test]
    fn timeline_ids_are_unique() {
        assert_ne!(TimelineId::new(), TimelineId::new());
    }
}
