use sessionstitch_core_types::ElementRef;
use sessionstitch_telemetry::DomSnapshotPayload;

/// Element-locating capability consumed by the mappers.
///
/// Given a DOM snapshot and an xpath, an implementation answers with an
/// opaque element handle or "not found". Treated as a pure, synchronous
/// dependency; the engine never computes xpaths itself.
pub trait ElementLocatorPort: Send + Sync {
    fn locate(&self, snapshot: &DomSnapshotPayload, xpath: &str) -> Option<ElementRef>;
}
