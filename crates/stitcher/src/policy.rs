use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StitchPolicyView {
    /// Suppress a click whose xpath equals the one directly before it
    /// (nested clickable elements fire twice for one user click).
    pub dedup_adjacent_clicks: bool,
    /// Discard GET network calls; read traffic is not a timeline action.
    pub drop_read_traffic: bool,
    /// Log dropped events at warn level. Mapper "no unit" skips stay silent.
    pub log_dropped_events: bool,
}

impl Default for StitchPolicyView {
    fn default() -> Self {
        Self {
            dedup_adjacent_clicks: true,
            drop_read_traffic: true,
            log_dropped_events: true,
        }
    }
}

static GLOBAL_POLICY: OnceCell<Arc<RwLock<StitchPolicyView>>> = OnceCell::new();

fn policy_cell() -> Arc<RwLock<StitchPolicyView>> {
    GLOBAL_POLICY
        .get_or_init(|| Arc::new(RwLock::new(StitchPolicyView::default())))
        .clone()
}

/// Hot-swappable policy handle; prefer constructing one per engine instance
/// and reserving [`StitchPolicyHandle::global`] for wiring convenience.
#[derive(Clone)]
pub struct StitchPolicyHandle {
    inner: Arc<RwLock<StitchPolicyView>>,
}

impl StitchPolicyHandle {
    pub fn new_with(view: StitchPolicyView) -> Self {
        Self {
            inner: Arc::new(RwLock::new(view)),
        }
    }

    pub fn global() -> Self {
        Self {
            inner: policy_cell(),
        }
    }

    pub fn snapshot(&self) -> StitchPolicyView {
        self.inner.read().clone()
    }

    pub fn update(&self, view: StitchPolicyView) {
        *self.inner.write() = view;
    }
}

impl Default for StitchPolicyHandle {
    fn default() -> Self {
        Self::new_with(StitchPolicyView::default())
    }
}
