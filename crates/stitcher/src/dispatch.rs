//! The coalescing state machine.
//!
//! One raw event at a time: classify, map, then decide against the timeline
//! tail whether to extend it in place, append a new entity (possibly preceded
//! by a synthetic location change) or drop the event. Processing one event is
//! atomic; any failure leaves the timeline exactly as it was.

use std::sync::Arc;

use tracing::{debug, warn};

use sessionstitch_telemetry::{InteractionCategory, RawEvent};

use crate::adapters::NoopLocator;
use crate::basepath::{midpoint, normalize};
use crate::entity::{
    ClickEntity, DataEntryEntity, EffectEntity, LocationChangeEntity, NetworkEntity,
    TimelineEntity,
};
use crate::errors::{StitchError, StitchResult};
use crate::mappers::{map_click, map_input, map_mutation, map_network};
use crate::model::DomMutationUnit;
use crate::policy::StitchPolicyHandle;
use crate::ports::ElementLocatorPort;
use crate::timeline::Timeline;

pub struct Stitcher {
    locator: Arc<dyn ElementLocatorPort>,
    policy: StitchPolicyHandle,
}

impl Stitcher {
    pub fn new(locator: Arc<dyn ElementLocatorPort>, policy: StitchPolicyHandle) -> Self {
        Self { locator, policy }
    }

    pub fn with_defaults() -> Self {
        Self::new(Arc::new(NoopLocator), StitchPolicyHandle::global())
    }

    /// Feeds one raw event into the timeline. Never fails from the caller's
    /// perspective: a malformed record or per-event invariant breach is
    /// logged and the event is discarded, leaving the timeline untouched.
    pub fn dispatch(&self, timeline: &mut Timeline, event: &RawEvent) {
        if let Err(err) = self.dispatch_inner(timeline, event) {
            if self.policy.snapshot().log_dropped_events {
                warn!(
                    event_name = %event.event_details.name,
                    session = %event.session_id,
                    %err,
                    "event dropped"
                );
            }
        }
    }

    /// Replays a whole ordered event list. Behaviorally identical to calling
    /// [`Stitcher::dispatch`] once per event on an empty timeline.
    pub fn parse(&self, events: &[RawEvent]) -> Timeline {
        let mut timeline = Timeline::new();
        for event in events {
            self.dispatch(&mut timeline, event);
        }
        timeline
    }

    fn dispatch_inner(&self, timeline: &mut Timeline, event: &RawEvent) -> StitchResult<()> {
        match event.category() {
            InteractionCategory::Click => self.on_click(timeline, event),
            InteractionCategory::Input => self.on_input(timeline, event),
            InteractionCategory::DomEffect => self.on_dom_effect(timeline, event),
            InteractionCategory::NetworkCall => self.on_network(timeline, event),
            InteractionCategory::Unrecognized => Ok(()),
        }
    }

    fn on_click(&self, timeline: &mut Timeline, event: &RawEvent) -> StitchResult<()> {
        let unit = map_click(event, self.locator.as_ref())?;
        if self.policy.snapshot().dedup_adjacent_clicks {
            if let Some(TimelineEntity::Click(previous)) = timeline.last() {
                if previous.xpath() == unit.xpath {
                    debug!(xpath = %unit.xpath, "duplicate click suppressed");
                    return Ok(());
                }
            }
        }
        timeline.append(TimelineEntity::Click(ClickEntity::new(unit)));
        Ok(())
    }

    fn on_input(&self, timeline: &mut Timeline, event: &RawEvent) -> StitchResult<()> {
        let unit = map_input(event, self.locator.as_ref())?;
        let unit = match timeline.last_mut() {
            Some(TimelineEntity::DataEntry(entry)) => match entry.try_absorb(unit) {
                Ok(()) => {
                    debug!("input absorbed into open data entry");
                    return Ok(());
                }
                Err(unit) => unit,
            },
            _ => unit,
        };
        timeline.append(TimelineEntity::DataEntry(DataEntryEntity::new(unit)));
        Ok(())
    }

    fn on_network(&self, timeline: &mut Timeline, event: &RawEvent) -> StitchResult<()> {
        let unit = map_network(event)?;
        if self.policy.snapshot().drop_read_traffic && unit.is_read() {
            debug!(url = %unit.url, "read traffic discarded");
            return Ok(());
        }
        timeline.append(TimelineEntity::Network(NetworkEntity::new(unit)));
        Ok(())
    }

    fn on_dom_effect(&self, timeline: &mut Timeline, event: &RawEvent) -> StitchResult<()> {
        let unit = match map_mutation(event, self.locator.as_ref())? {
            Some(unit) => unit,
            // No anchorable node in the batch: silent skip, no log noise.
            None => return Ok(()),
        };

        if let Some(TimelineEntity::Effect(effect)) = timeline.last() {
            let window_uri = effect.sole_base_uri().map(str::to_string).ok_or_else(|| {
                StitchError::CorruptEffectWindow {
                    count: effect.base_uris().len(),
                }
            })?;
            let window_last = effect.last_timestamp();

            if normalize(&window_uri) == normalize(&unit.base_uri) {
                if let Some(TimelineEntity::Effect(effect)) = timeline.last_mut() {
                    effect.absorb(unit);
                }
                return Ok(());
            }

            debug!(from = %window_uri, to = %unit.base_uri, "location change between effects");
            timeline.append(TimelineEntity::LocationChange(LocationChangeEntity {
                from: window_uri,
                to: unit.base_uri.clone(),
                timestamp: midpoint(window_last, unit.timestamp),
            }));
            timeline.append(TimelineEntity::Effect(EffectEntity::new(unit)));
            return Ok(());
        }

        self.start_effect_window(timeline, unit);
        Ok(())
    }

    /// Opens a new effect window when the tail is not an effect, inserting a
    /// location change first when the tail establishes a different base path.
    fn start_effect_window(&self, timeline: &mut Timeline, unit: DomMutationUnit) {
        let previous = timeline.last().and_then(|entity| {
            let url = match entity {
                TimelineEntity::Network(network) => network.referer().map(str::to_string),
                TimelineEntity::Click(click) => non_empty(click.base_uri()),
                TimelineEntity::DataEntry(entry) => non_empty(&entry.last_change().base_uri),
                // Location changes and corrupted tails establish no base path.
                _ => None,
            };
            url.map(|url| (url, entity.last_timestamp()))
        });

        if let Some((last_url, last_ts)) = previous {
            if normalize(&last_url) != normalize(&unit.base_uri) {
                debug!(from = %last_url, to = %unit.base_uri, "location change before effect");
                timeline.append(TimelineEntity::LocationChange(LocationChangeEntity {
                    from: last_url,
                    to: unit.base_uri.clone(),
                    timestamp: midpoint(last_ts, unit.timestamp),
                }));
            }
        }
        timeline.append(TimelineEntity::Effect(EffectEntity::new(unit)));
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
