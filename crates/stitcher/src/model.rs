//! Atomic units: the minimal structured fact extracted from one raw event.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sessionstitch_core_types::{ElementRef, SnapshotRef};
use sessionstitch_telemetry::payload::header_value;
use sessionstitch_telemetry::{ElementPayload, MutationAction};

#[derive(Debug, Clone, Serialize)]
pub struct ClickUnit {
    pub xpath: String,
    pub tag: String,
    #[serde(rename = "baseURI")]
    pub base_uri: String,
    #[serde(rename = "htmlId", skip_serializing_if = "Option::is_none")]
    pub html_id: Option<String>,
    #[serde(rename = "domSnapshotRef", skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotRef>,
    #[serde(rename = "elementRef", skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementRef>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputUnit {
    pub xpath: String,
    pub tag: String,
    #[serde(rename = "htmlId", skip_serializing_if = "Option::is_none")]
    pub html_id: Option<String>,
    #[serde(rename = "baseURI")]
    pub base_uri: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(rename = "domSnapshotRef", skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotRef>,
    #[serde(rename = "elementRef", skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementRef>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "editorKind")]
    pub editor_kind: EditorKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomMutationUnit {
    pub xpath: String,
    pub tag: String,
    #[serde(rename = "htmlId", skip_serializing_if = "Option::is_none")]
    pub html_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "baseURI")]
    pub base_uri: String,
    pub action: MutationAction,
    #[serde(rename = "domSnapshotRef", skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotRef>,
    #[serde(rename = "elementRef", skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementRef>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkUnit {
    pub method: String,
    pub url: String,
    #[serde(rename = "requestHeaders")]
    pub request_headers: BTreeMap<String, String>,
    #[serde(rename = "responseHeaders")]
    pub response_headers: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl NetworkUnit {
    /// The page the call was issued from, if the client reported it.
    pub fn referer(&self) -> Option<&str> {
        header_value(&self.request_headers, "referer").filter(|value| !value.is_empty())
    }

    pub fn is_read(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// Rough shape of the control a value was typed into.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorKind {
    Text,
    TextArea,
    Select,
    ContentEditable,
    Unknown,
}

impl EditorKind {
    pub fn of_element(element: &ElementPayload) -> Self {
        match element.local_name.as_deref() {
            Some("textarea") => Self::TextArea,
            Some("select") => Self::Select,
            Some("input") => Self::Text,
            _ => {
                let editable = element
                    .outer_html
                    .as_deref()
                    .map(|html| html.contains("contenteditable"))
                    .unwrap_or(false);
                if editable {
                    Self::ContentEditable
                } else {
                    Self::Unknown
                }
            }
        }
    }
}
