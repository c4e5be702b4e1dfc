//! The ordered, append-only output sequence plus its notification bus.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sessionstitch_core_types::TimelineId;
use tracing::warn;

use crate::entity::TimelineEntity;
use crate::errors::StitchResult;

pub type EntityPredicate = Box<dyn Fn(&TimelineEntity) -> bool + Send>;
pub type EntityListener = Box<dyn FnMut(&TimelineEntity) -> StitchResult<()> + Send>;

struct Subscriber {
    predicate: EntityPredicate,
    listener: EntityListener,
}

/// One session's reconstructed timeline.
///
/// Created empty by the caller and mutated exclusively through the
/// dispatcher; `append` is crate-private so no external writer exists.
/// Annotations are caller-owned metadata the engine never touches.
pub struct Timeline {
    id: TimelineId,
    entities: Vec<TimelineEntity>,
    annotations: BTreeMap<String, String>,
    subscribers: Vec<Subscriber>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::with_id(TimelineId::new())
    }

    pub fn with_id(id: TimelineId) -> Self {
        Self {
            id,
            entities: Vec::new(),
            annotations: BTreeMap::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn id(&self) -> &TimelineId {
        &self.id
    }

    pub fn entities(&self) -> &[TimelineEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn last(&self) -> Option<&TimelineEntity> {
        self.entities.last()
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut TimelineEntity> {
        self.entities.last_mut()
    }

    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key.into(), value.into());
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    /// Registers a `(predicate, listener)` pair fired synchronously, in
    /// registration order, whenever a new entity is appended. In-place
    /// extension of an existing aggregate never fires.
    pub fn subscribe<P, L>(&mut self, predicate: P, listener: L)
    where
        P: Fn(&TimelineEntity) -> bool + Send + 'static,
        L: FnMut(&TimelineEntity) -> StitchResult<()> + Send + 'static,
    {
        self.subscribers.push(Subscriber {
            predicate: Box::new(predicate),
            listener: Box::new(listener),
        });
    }

    /// The single mutation point observed by subscribers. A failing listener
    /// is logged and isolated; it never aborts dispatch of the current event.
    pub(crate) fn append(&mut self, entity: TimelineEntity) {
        self.entities.push(entity);
        if let Some(appended) = self.entities.last() {
            for subscriber in &mut self.subscribers {
                if (subscriber.predicate)(appended) {
                    if let Err(err) = (subscriber.listener)(appended) {
                        warn!(symbol = appended.symbol(), %err, "timeline listener failed");
                    }
                }
            }
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("id", &self.id)
            .field("entities", &self.entities)
            .field("annotations", &self.annotations)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Serialize for Timeline {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("data", &self.entities)?;
        map.serialize_entry("annotations", &self.annotations)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::LocationChangeEntity;
    use crate::errors::StitchError;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn loc_change(n: i64) -> TimelineEntity {
        TimelineEntity::LocationChange(LocationChangeEntity {
            from: "https://a/1".to_string(),
            to: "https://a/2".to_string(),
            timestamp: Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap(),
        })
    }

    #[test]
    fn listeners_fire_in_registration_order_when_predicate_accepts() {
        let mut timeline = Timeline::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&calls);
        timeline.subscribe(
            |entity| entity.symbol() == "LOC_CHANGE",
            move |_| {
                first.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        let second = Arc::clone(&calls);
        timeline.subscribe(
            |entity| entity.symbol() == "CLICK",
            move |_| {
                second.fetch_add(100, Ordering::SeqCst);
                Ok(())
            },
        );

        timeline.append(loc_change(0));
        timeline.append(loc_change(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn failing_listener_does_not_block_later_listeners() {
        let mut timeline = Timeline::new();
        let reached = Arc::new(AtomicUsize::new(0));

        timeline.subscribe(
            |_| true,
            |_| Err(StitchError::Listener("boom".to_string())),
        );
        let reached_clone = Arc::clone(&reached);
        timeline.subscribe(
            |_| true,
            move |_| {
                reached_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );

        timeline.append(loc_change(0));
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn serializes_entities_under_data() {
        let mut timeline = Timeline::new();
        timeline.annotate("source", "index-7");
        timeline.append(loc_change(0));

        let json = serde_json::to_value(&timeline).unwrap();
        assert_eq!(json["annotations"]["source"], "index-7");
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["symbol"], "LOC_CHANGE");
        assert!(json["id"].is_string());
    }
}
