//! One pure mapper per interaction category: raw event in, atomic unit out.

use sessionstitch_core_types::{ElementRef, SnapshotRef};
use sessionstitch_telemetry::payload::{
    embedded_json, html_attr, metadata_value, parse_header_map, required_embedded_json,
};
use sessionstitch_telemetry::{
    DomSnapshotPayload, ElementPayload, MutationAction, MutationNodePayload, RawEvent,
    TelemetryError,
};

use crate::errors::StitchResult;
use crate::model::{ClickUnit, DomMutationUnit, EditorKind, InputUnit, NetworkUnit};
use crate::ports::ElementLocatorPort;

pub fn map_click(event: &RawEvent, locator: &dyn ElementLocatorPort) -> StitchResult<ClickUnit> {
    let element: ElementPayload = required_embedded_json(event, "element")?;
    let xpath = element
        .xpath
        .clone()
        .filter(|xpath| !xpath.is_empty())
        .ok_or(TelemetryError::MissingField("element.xpath"))?;
    let (snapshot, element_ref) = resolve_snapshot(event, locator, &xpath)?;

    Ok(ClickUnit {
        tag: element.local_name.unwrap_or_default(),
        base_uri: element.base_uri.unwrap_or_default(),
        html_id: element.id.filter(|id| !id.is_empty()),
        snapshot,
        element: element_ref,
        timestamp: event.timestamp(),
        xpath,
    })
}

pub fn map_input(event: &RawEvent, locator: &dyn ElementLocatorPort) -> StitchResult<InputUnit> {
    let element: ElementPayload = required_embedded_json(event, "element")?;
    // The capture layer puts the authoritative xpath at the top level for
    // input events; the element body is the fallback.
    let xpath = event
        .detail_str("xpath")
        .filter(|xpath| !xpath.is_empty())
        .map(str::to_string)
        .or_else(|| element.xpath.clone().filter(|xpath| !xpath.is_empty()))
        .ok_or(TelemetryError::MissingField("xpath"))?;
    let value =
        metadata_value(event, "fieldValue")?.ok_or(TelemetryError::MissingField("fieldValue"))?;
    let placeholder = element
        .outer_html
        .as_deref()
        .and_then(|html| html_attr(html, "placeholder"))
        .filter(|text| !text.is_empty());
    let editor_kind = EditorKind::of_element(&element);
    let (snapshot, element_ref) = resolve_snapshot(event, locator, &xpath)?;

    Ok(InputUnit {
        tag: element.local_name.unwrap_or_default(),
        html_id: element.id.filter(|id| !id.is_empty()),
        base_uri: element.base_uri.unwrap_or_default(),
        value,
        placeholder,
        snapshot,
        element: element_ref,
        timestamp: event.timestamp(),
        editor_kind,
        xpath,
    })
}

/// Maps a DOM mutation batch to a single unit, taking the first node with a
/// usable xpath and base URI. `Ok(None)` means the batch carried nothing the
/// timeline can anchor to; that is a silent skip, not an error.
pub fn map_mutation(
    event: &RawEvent,
    locator: &dyn ElementLocatorPort,
) -> StitchResult<Option<DomMutationUnit>> {
    let action_raw = event
        .detail_str("action")
        .ok_or(TelemetryError::MissingField("action"))?;
    let action = MutationAction::parse(action_raw).ok_or_else(|| TelemetryError::InvalidField {
        field: "action",
        reason: format!("unknown mutation action {action_raw:?}"),
    })?;

    let nodes: Vec<MutationNodePayload> = match embedded_json(event, "nodes")? {
        Some(nodes) => nodes,
        None => return Ok(None),
    };
    let node = match nodes.into_iter().find(usable_node) {
        Some(node) => node,
        None => return Ok(None),
    };
    let xpath = node.xpath.unwrap_or_default();
    let base_uri = node.base_uri.unwrap_or_default();
    let (snapshot, element_ref) = resolve_snapshot(event, locator, &xpath)?;

    Ok(Some(DomMutationUnit {
        tag: node.local_name.unwrap_or_default(),
        html_id: node.id.filter(|id| !id.is_empty()),
        text: node.outer_text.filter(|text| !text.is_empty()),
        action,
        snapshot,
        element: element_ref,
        timestamp: event.timestamp(),
        xpath,
        base_uri,
    }))
}

pub fn map_network(event: &RawEvent) -> StitchResult<NetworkUnit> {
    let method = event
        .detail_str("method")
        .filter(|method| !method.is_empty())
        .ok_or(TelemetryError::MissingField("method"))?
        .to_string();
    let url = event
        .detail_str("url")
        .filter(|url| !url.is_empty())
        .ok_or(TelemetryError::MissingField("url"))?
        .to_string();
    let request_headers = parse_header_map(event, "requestHeaders")?;
    let response_headers = parse_header_map(event, "responseHeaders")?;

    Ok(NetworkUnit {
        method,
        url,
        request_headers,
        response_headers,
        timestamp: event.timestamp(),
    })
}

fn usable_node(node: &MutationNodePayload) -> bool {
    node.xpath.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
        && node
            .base_uri
            .as_deref()
            .map(|s| !s.is_empty())
            .unwrap_or(false)
}

fn resolve_snapshot(
    event: &RawEvent,
    locator: &dyn ElementLocatorPort,
    xpath: &str,
) -> StitchResult<(Option<SnapshotRef>, Option<ElementRef>)> {
    let snapshot: Option<DomSnapshotPayload> = embedded_json(event, "domSnapshot")?;
    let snapshot_ref = snapshot
        .as_ref()
        .and_then(|body| body.outer_html.as_deref())
        .map(SnapshotRef::digest_of);
    let element_ref = snapshot
        .as_ref()
        .and_then(|body| locator.locate(body, xpath));
    Ok((snapshot_ref, element_ref))
}
