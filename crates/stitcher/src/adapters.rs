use sessionstitch_core_types::ElementRef;
use sessionstitch_telemetry::DomSnapshotPayload;

use crate::ports::ElementLocatorPort;

/// Locator that never resolves anything. Units then carry no element handle,
/// which every consumer must tolerate anyway.
#[derive(Default)]
pub struct NoopLocator;

impl ElementLocatorPort for NoopLocator {
    fn locate(&self, _snapshot: &DomSnapshotPayload, _xpath: &str) -> Option<ElementRef> {
        None
    }
}
