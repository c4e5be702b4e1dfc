//! Re-parsing of embedded payload bodies.
//!
//! The capture extension serializes nested objects into JSON strings before
//! shipping them, so `element`, `nodes`, `domSnapshot` and the header maps all
//! need a second decode. Absent fields, empty strings and the literal string
//! `"null"` are equivalent: no payload.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{TelemetryError, TelemetryResult};
use crate::model::RawEvent;

/// The `element` body attached to click and input events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementPayload {
    #[serde(default)]
    pub xpath: Option<String>,
    #[serde(rename = "localName", default)]
    pub local_name: Option<String>,
    #[serde(rename = "baseURI", default)]
    pub base_uri: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "outerHTML", default)]
    pub outer_html: Option<String>,
    #[serde(rename = "offsetWidth", default)]
    pub offset_width: Option<f64>,
    #[serde(rename = "offsetHeight", default)]
    pub offset_height: Option<f64>,
}

/// One node of a DOM mutation batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationNodePayload {
    #[serde(default)]
    pub xpath: Option<String>,
    #[serde(rename = "localName", default)]
    pub local_name: Option<String>,
    #[serde(rename = "baseURI", default)]
    pub base_uri: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "outerHTML", default)]
    pub outer_html: Option<String>,
    #[serde(rename = "outerText", default)]
    pub outer_text: Option<String>,
}

/// Serialized DOM snapshot accompanying an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomSnapshotPayload {
    #[serde(rename = "outerHTML", default)]
    pub outer_html: Option<String>,
}

/// One entry of the input event `metadata` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

/// DOM mutation verb, parsed case-insensitively from `eventDetails.action`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    Add,
    Remove,
    Show,
    Hide,
}

impl MutationAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "show" => Some(Self::Show),
            "hide" => Some(Self::Hide),
            _ => None,
        }
    }

    /// Add/Show reveal content, Remove/Hide take it away.
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Add | Self::Show)
    }
}

/// Decodes a detail field holding a JSON-encoded body.
pub fn embedded_json<T: DeserializeOwned>(
    event: &RawEvent,
    field: &'static str,
) -> TelemetryResult<Option<T>> {
    let raw = match event.detail(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim(),
        // Some producers skip the double-encode; accept the object as-is.
        Some(other) => {
            return serde_json::from_value(other.clone())
                .map(Some)
                .map_err(|source| TelemetryError::EmbeddedJson { field, source })
        }
    };
    if raw.is_empty() || raw == "null" {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|source| TelemetryError::EmbeddedJson { field, source })
}

/// Same as [`embedded_json`] but treats an absent body as an error.
pub fn required_embedded_json<T: DeserializeOwned>(
    event: &RawEvent,
    field: &'static str,
) -> TelemetryResult<T> {
    embedded_json(event, field)?.ok_or(TelemetryError::MissingField(field))
}

/// Header maps arrive either as a JSON object or as a webRequest-style array
/// of `{name, value}` entries; a literal `"null"` body means no headers.
pub fn parse_header_map(
    event: &RawEvent,
    field: &'static str,
) -> TelemetryResult<BTreeMap<String, String>> {
    let body: Option<Value> = embedded_json(event, field)?;
    let mut headers = BTreeMap::new();
    match body {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (name, value) in map {
                headers.insert(name, value_to_text(&value));
            }
        }
        Some(Value::Array(entries)) => {
            for entry in entries {
                let name = entry.get("name").and_then(Value::as_str);
                let value = entry.get("value");
                if let (Some(name), Some(value)) = (name, value) {
                    headers.insert(name.to_string(), value_to_text(value));
                }
            }
        }
        Some(_) => {
            return Err(TelemetryError::InvalidField {
                field,
                reason: "expected a header object or entry array".to_string(),
            })
        }
    }
    Ok(headers)
}

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// The input event metadata array, tolerant of the double-encode.
pub fn metadata_entries(event: &RawEvent) -> TelemetryResult<Vec<MetadataEntry>> {
    Ok(embedded_json(event, "metadata")?.unwrap_or_default())
}

/// Value of a named metadata entry, stringified.
pub fn metadata_value(event: &RawEvent, name: &str) -> TelemetryResult<Option<String>> {
    let entries = metadata_entries(event)?;
    Ok(entries
        .into_iter()
        .find(|entry| entry.name == name)
        .map(|entry| value_to_text(&entry.value)))
}

/// Best-effort attribute extraction from an `outerHTML` fragment. Good enough
/// for `placeholder` and friends; not an HTML parser and not meant to be one.
pub fn html_attr(outer_html: &str, attr: &str) -> Option<String> {
    let needle = format!("{attr}=");
    let mut search_from = 0;
    while let Some(rel) = outer_html[search_from..].find(&needle) {
        let at = search_from + rel;
        // Reject substring hits like `data-placeholder=`.
        let boundary_ok = at == 0
            || outer_html[..at]
                .chars()
                .next_back()
                .map(|c| c.is_whitespace())
                .unwrap_or(false);
        let rest = &outer_html[at + needle.len()..];
        if boundary_ok {
            let mut chars = rest.chars();
            return match chars.next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = chars.as_str();
                    body.find(quote).map(|end| body[..end].to_string())
                }
                Some(first) if !first.is_whitespace() && first != '>' => {
                    let body = &rest[..];
                    let end = body
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(body.len());
                    Some(body[..end].to_string())
                }
                _ => Some(String::new()),
            };
        }
        search_from = at + needle.len();
    }
    None
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_with(fields: Value) -> RawEvent {
        serde_json::from_value(json!({
            "eventType": "interactionEvent",
            "eventDetails": fields,
            "timestamps": { "eventTimestamp": "2024-03-01T10:00:00Z" },
            "sessionID": "s"
        }))
        .unwrap()
    }

    #[test]
    fn embedded_element_body_is_reparsed() {
        let inner = json!({
            "xpath": "/html/body/div[2]",
            "localName": "input",
            "baseURI": "https://app.example/pages/7",
            "id": "name",
            "outerHTML": "<input id=\"name\" placeholder=\"Full name\">"
        });
        let event = event_with(json!({
            "name": "input",
            "element": inner.to_string()
        }));
        let element: ElementPayload = required_embedded_json(&event, "element").unwrap();
        assert_eq!(element.xpath.as_deref(), Some("/html/body/div[2]"));
        assert_eq!(element.local_name.as_deref(), Some("input"));
        assert_eq!(
            html_attr(element.outer_html.as_deref().unwrap(), "placeholder").as_deref(),
            Some("Full name")
        );
    }

    #[test]
    fn literal_null_body_means_absent() {
        let event = event_with(json!({ "name": "networkCall", "requestHeaders": "null" }));
        let headers = parse_header_map(&event, "requestHeaders").unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn header_maps_accept_object_and_entry_array() {
        let event = event_with(json!({
            "name": "networkCall",
            "requestHeaders": "{\"Referer\":\"https://app.example/a/1\"}",
            "responseHeaders": "[{\"name\":\"Content-Type\",\"value\":\"text/html\"}]"
        }));
        let req = parse_header_map(&event, "requestHeaders").unwrap();
        let res = parse_header_map(&event, "responseHeaders").unwrap();
        assert_eq!(header_value(&req, "referer"), Some("https://app.example/a/1"));
        assert_eq!(header_value(&res, "content-type"), Some("text/html"));
    }

    #[test]
    fn metadata_field_value_is_extracted() {
        let event = event_with(json!({
            "name": "input",
            "metadata": "[{\"name\":\"fieldValue\",\"value\":\"hello\"}]"
        }));
        assert_eq!(
            metadata_value(&event, "fieldValue").unwrap().as_deref(),
            Some("hello")
        );
        assert_eq!(metadata_value(&event, "missing").unwrap(), None);
    }

    #[test]
    fn mutation_action_parses_case_insensitively() {
        assert_eq!(MutationAction::parse("Add"), Some(MutationAction::Add));
        assert_eq!(MutationAction::parse("HIDE"), Some(MutationAction::Hide));
        assert_eq!(MutationAction::parse("blur"), None);
        assert!(MutationAction::Show.is_visible());
        assert!(!MutationAction::Remove.is_visible());
    }

    #[test]
    fn html_attr_ignores_prefixed_attributes() {
        let html = "<div data-placeholder=\"no\" placeholder=\"yes\">";
        assert_eq!(html_attr(html, "placeholder").as_deref(), Some("yes"));
    }
}
