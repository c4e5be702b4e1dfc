//! Timeline entities: the closed output vocabulary of the engine.
//!
//! One tagged union, so the dispatcher matches exhaustively and adding a
//! category is a compile-time change. The two aggregates keep their mutators
//! `pub(crate)`: only the dispatcher may extend a tail entity in place.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::model::{ClickUnit, DomMutationUnit, EditorKind, InputUnit, NetworkUnit};

pub const SYMBOL_CLICK: &str = "CLICK";
pub const SYMBOL_DATA_ENTRY: &str = "DATA_ENTRY";
pub const SYMBOL_EFFECT: &str = "EFFECT";
pub const SYMBOL_LOC_CHANGE: &str = "LOC_CHANGE";
pub const SYMBOL_NET: &str = "NET";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "symbol")]
pub enum TimelineEntity {
    #[serde(rename = "CLICK")]
    Click(ClickEntity),
    #[serde(rename = "DATA_ENTRY")]
    DataEntry(DataEntryEntity),
    #[serde(rename = "EFFECT")]
    Effect(EffectEntity),
    #[serde(rename = "LOC_CHANGE")]
    LocationChange(LocationChangeEntity),
    #[serde(rename = "NET")]
    Network(NetworkEntity),
}

impl TimelineEntity {
    /// Timestamp of the entity's creation (first absorbed unit for aggregates).
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Click(entity) => entity.timestamp(),
            Self::DataEntry(entity) => entity.timestamp(),
            Self::Effect(entity) => entity.timestamp(),
            Self::LocationChange(entity) => entity.timestamp,
            Self::Network(entity) => entity.timestamp(),
        }
    }

    /// Timestamp of the most recent absorbed unit; equals [`Self::timestamp`]
    /// for non-aggregate entities.
    pub fn last_timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::DataEntry(entity) => entity.last_change().timestamp,
            Self::Effect(entity) => entity.last_timestamp(),
            other => other.timestamp(),
        }
    }

    /// Short discriminator used by downstream filters.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Click(_) => SYMBOL_CLICK,
            Self::DataEntry(_) => SYMBOL_DATA_ENTRY,
            Self::Effect(_) => SYMBOL_EFFECT,
            Self::LocationChange(_) => SYMBOL_LOC_CHANGE,
            Self::Network(_) => SYMBOL_NET,
        }
    }
}

/// One user click. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct ClickEntity {
    #[serde(flatten)]
    unit: ClickUnit,
}

impl ClickEntity {
    pub fn new(unit: ClickUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> &ClickUnit {
        &self.unit
    }

    pub fn xpath(&self) -> &str {
        &self.unit.xpath
    }

    pub fn base_uri(&self) -> &str {
        &self.unit.base_uri
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.unit.timestamp
    }
}

/// A burst of edits against one input target, coalesced into one entity.
#[derive(Debug, Clone)]
pub struct DataEntryEntity {
    changes: Vec<InputUnit>,
}

impl DataEntryEntity {
    pub fn new(first: InputUnit) -> Self {
        Self {
            changes: vec![first],
        }
    }

    pub fn changes(&self) -> &[InputUnit] {
        &self.changes
    }

    pub fn last_change(&self) -> &InputUnit {
        // Non-empty by construction.
        &self.changes[self.changes.len() - 1]
    }

    /// Value of the most recent edit.
    pub fn entered_value(&self) -> &str {
        &self.last_change().value
    }

    pub fn editor_kind(&self) -> EditorKind {
        self.last_change().editor_kind
    }

    /// The established target identity: xpath of the seed unit.
    pub fn xpath(&self) -> &str {
        &self.changes[0].xpath
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.changes[0].timestamp
    }

    fn same_target(&self, unit: &InputUnit) -> bool {
        let last = self.last_change();
        if let (Some(a), Some(b)) = (&last.element, &unit.element) {
            return a == b;
        }
        !unit.xpath.is_empty() && unit.xpath == last.xpath
    }

    /// Absorbs the unit if it targets the same element; hands it back otherwise.
    pub(crate) fn try_absorb(&mut self, unit: InputUnit) -> Result<(), InputUnit> {
        if self.same_target(&unit) {
            self.changes.push(unit);
            Ok(())
        } else {
            Err(unit)
        }
    }
}

impl Serialize for DataEntryEntity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("timestamp", &self.timestamp())?;
        map.serialize_entry("xpath", self.xpath())?;
        map.serialize_entry("value", self.entered_value())?;
        map.serialize_entry("editorKind", &self.editor_kind())?;
        map.serialize_entry("changes", &self.changes)?;
        map.end()
    }
}

/// A window of DOM mutations observed on one page.
#[derive(Debug, Clone)]
pub struct EffectEntity {
    mutations: Vec<DomMutationUnit>,
}

impl EffectEntity {
    pub fn new(first: DomMutationUnit) -> Self {
        Self {
            mutations: vec![first],
        }
    }

    pub fn mutations(&self) -> &[DomMutationUnit] {
        &self.mutations
    }

    /// Distinct raw base URIs of the absorbed mutations. A healthy window has
    /// exactly one; coalescing equivalent `pages/*` slugs can legitimately
    /// grow the set, at which point the window stops accepting events.
    pub fn base_uris(&self) -> BTreeSet<&str> {
        self.mutations
            .iter()
            .map(|unit| unit.base_uri.as_str())
            .collect()
    }

    /// The window's base URI when it is unambiguous.
    pub fn sole_base_uri(&self) -> Option<&str> {
        let uris = self.base_uris();
        if uris.len() == 1 {
            uris.into_iter().next()
        } else {
            None
        }
    }

    /// Mutations that reveal content (Add/Show).
    pub fn visible_units(&self) -> Vec<&DomMutationUnit> {
        self.mutations
            .iter()
            .filter(|unit| unit.action.is_visible())
            .collect()
    }

    /// Mutations that take content away (Remove/Hide).
    pub fn hidden_units(&self) -> Vec<&DomMutationUnit> {
        self.mutations
            .iter()
            .filter(|unit| !unit.action.is_visible())
            .collect()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.mutations[0].timestamp
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.mutations[self.mutations.len() - 1].timestamp
    }

    pub(crate) fn absorb(&mut self, unit: DomMutationUnit) {
        self.mutations.push(unit);
    }
}

impl Serialize for EffectEntity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let base_uris: Vec<&str> = self.base_uris().into_iter().collect();
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("timestamp", &self.timestamp())?;
        map.serialize_entry("baseURIs", &base_uris)?;
        map.serialize_entry("mutations", &self.mutations)?;
        map.end()
    }
}

/// Synthetic navigation marker, only ever produced by the dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct LocationChangeEntity {
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
}

/// One non-GET network call.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkEntity {
    #[serde(flatten)]
    unit: NetworkUnit,
}

impl NetworkEntity {
    pub fn new(unit: NetworkUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> &NetworkUnit {
        &self.unit
    }

    pub fn method(&self) -> &str {
        &self.unit.method
    }

    pub fn url(&self) -> &str {
        &self.unit.url
    }

    pub fn referer(&self) -> Option<&str> {
        self.unit.referer()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.unit.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EditorKind;
    use chrono::TimeZone;
    use sessionstitch_telemetry::MutationAction;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn input(xpath: &str, value: &str, secs: i64) -> InputUnit {
        InputUnit {
            xpath: xpath.to_string(),
            tag: "input".to_string(),
            html_id: None,
            base_uri: "https://app.example/form".to_string(),
            value: value.to_string(),
            placeholder: None,
            snapshot: None,
            element: None,
            timestamp: ts(secs),
            editor_kind: EditorKind::Text,
        }
    }

    fn mutation(action: MutationAction, base_uri: &str, secs: i64) -> DomMutationUnit {
        DomMutationUnit {
            xpath: "/html/body/div".to_string(),
            tag: "div".to_string(),
            html_id: None,
            text: None,
            base_uri: base_uri.to_string(),
            action,
            snapshot: None,
            element: None,
            timestamp: ts(secs),
        }
    }

    #[test]
    fn data_entry_absorbs_same_target_only() {
        let mut entry = DataEntryEntity::new(input("/form/input[1]", "a", 0));
        assert!(entry.try_absorb(input("/form/input[1]", "ab", 1)).is_ok());
        assert!(entry.try_absorb(input("/form/input[2]", "x", 2)).is_err());
        assert_eq!(entry.entered_value(), "ab");
        assert_eq!(entry.changes().len(), 2);
        assert_eq!(entry.timestamp(), ts(0));
        assert_eq!(entry.last_change().timestamp, ts(1));
    }

    #[test]
    fn empty_xpath_never_matches_a_target() {
        let mut entry = DataEntryEntity::new(input("", "a", 0));
        assert!(entry.try_absorb(input("", "b", 1)).is_err());
    }

    #[test]
    fn effect_partitions_visible_and_hidden() {
        let mut effect = EffectEntity::new(mutation(MutationAction::Add, "https://a/p", 0));
        effect.absorb(mutation(MutationAction::Hide, "https://a/p", 1));
        effect.absorb(mutation(MutationAction::Show, "https://a/p", 2));
        assert_eq!(effect.visible_units().len(), 2);
        assert_eq!(effect.hidden_units().len(), 1);
        assert_eq!(effect.sole_base_uri(), Some("https://a/p"));
        assert_eq!(effect.last_timestamp(), ts(2));
    }

    #[test]
    fn effect_window_with_mixed_uris_has_no_sole_base() {
        let mut effect = EffectEntity::new(mutation(MutationAction::Add, "https://a/pages/1", 0));
        effect.absorb(mutation(MutationAction::Add, "https://a/pages/2", 1));
        assert_eq!(effect.base_uris().len(), 2);
        assert_eq!(effect.sole_base_uri(), None);
    }

    #[test]
    fn entities_serialize_under_their_symbol() {
        let entity = TimelineEntity::DataEntry(DataEntryEntity::new(input("/form/x", "hi", 0)));
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["symbol"], "DATA_ENTRY");
        assert_eq!(json["value"], "hi");
        assert_eq!(json["editorKind"], "text");
        assert_eq!(entity.symbol(), SYMBOL_DATA_ENTRY);

        let loc = TimelineEntity::LocationChange(LocationChangeEntity {
            from: "https://a/1".to_string(),
            to: "https://a/2".to_string(),
            timestamp: ts(0),
        });
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["symbol"], "LOC_CHANGE");
        assert_eq!(json["from"], "https://a/1");
        assert_eq!(json["to"], "https://a/2");
    }
}
