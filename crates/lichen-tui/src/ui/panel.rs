//! Worker-backed and synchronous attribution panels.
//!
//! The contained-external panel talks to the aggregation worker and keeps a
//! synchronous fallback path so it always shows a correct-as-of-now result:
//! before the worker cache warms up, when the worker is unavailable, and
//! whenever a send fails. Replies are correlated by the echoed resource id;
//! a reply for a superseded selection is discarded, never rendered.

use lichen_core::containment::{
    get_contained_external_packages, get_contained_manual_packages, AttributionIdWithCount,
};
use lichen_core::models::can_have_children;
use lichen_core::runtime::CoreHandle;
use lichen_core::stats::SharedAggregationStats;
use lichen_core::store::AttributionStore;
use lichen_core::worker::{AggregationReply, AggregationRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    AwaitingWorkerReply,
    Rendered,
    /// Stable rendering state, not a transient: the panel stays here until
    /// the next selection change or a matching worker reply arrives.
    FallbackComputed,
}

pub struct WorkerBackedPanel {
    pub state: PanelState,
    pub rows: Vec<AttributionIdWithCount>,
    /// Cleared when a send fails; all later requests go straight to the
    /// synchronous path.
    worker_available: bool,
    stats: SharedAggregationStats,
}

impl WorkerBackedPanel {
    pub fn new(worker_available: bool, stats: SharedAggregationStats) -> Self {
        Self {
            state: PanelState::Idle,
            rows: Vec::new(),
            worker_available,
            stats,
        }
    }

    /// Selection changed: dispatch a worker query, or compute synchronously
    /// when no worker can serve it. Non-directories always render empty.
    pub fn refresh(&mut self, handle: Option<&CoreHandle>, store: &AttributionStore) {
        if !can_have_children(store.selected_resource_id()) {
            self.rows.clear();
            self.state = PanelState::Idle;
            return;
        }

        if self.worker_available {
            if let Some(handle) = handle {
                let request = AggregationRequest::query(
                    store.selected_resource_id().to_string(),
                    store.resolved_external_attributions().clone(),
                );
                match handle.send_request(request) {
                    Ok(()) => {
                        self.state = PanelState::AwaitingWorkerReply;
                        return;
                    }
                    Err(_) => {
                        tracing::warn!("aggregation worker unreachable; using sync path");
                        self.worker_available = false;
                    }
                }
            } else {
                self.worker_available = false;
            }
        }

        self.compute_fallback(store);
    }

    /// Feed one worker reply through the correlation check.
    pub fn on_reply(&mut self, reply: AggregationReply, store: &AttributionStore) {
        match reply.output {
            Some(output) => {
                if output.resource_id == store.selected_resource_id() {
                    self.rows = output.attribution_ids_with_count;
                    self.state = PanelState::Rendered;
                } else {
                    // Stale reply for a superseded selection.
                    tracing::trace!(
                        resource_id = %output.resource_id,
                        "discarding stale aggregation reply"
                    );
                }
            }
            // Cold cache: compute now, the worker will catch up after the
            // next cache refresh.
            None => self.compute_fallback(store),
        }
    }

    fn compute_fallback(&mut self, store: &AttributionStore) {
        self.stats.record_fallback();
        let external_data = store.external_panel_data();
        self.rows = get_contained_external_packages(
            store.selected_resource_id(),
            &external_data,
            Some(store.resolved_external_attributions()),
        );
        self.state = PanelState::FallbackComputed;
    }
}

/// Synchronous-only panel: the manual contained path and the direct panel.
#[derive(Debug, Default)]
pub struct SyncPanel {
    pub rows: Vec<AttributionIdWithCount>,
}

impl SyncPanel {
    /// Contained manual attributions. Recomputed on selection changes and
    /// manual-mapping edits only — the attributions table is deliberately
    /// not a recompute trigger, so displayed metadata may briefly lag a
    /// concurrent edit until the next trigger fires (bounded staleness).
    pub fn refresh_contained_manual(&mut self, store: &AttributionStore) {
        let manual_data = store.manual_panel_data();
        self.rows = get_contained_manual_packages(store.selected_resource_id(), &manual_data);
    }

    /// Attributions attached directly to the selected resource.
    pub fn refresh_direct_external(&mut self, store: &AttributionStore) {
        self.rows = lichen_core::containment::get_attribution_ids_with_count(
            store.direct_external_attribution_ids(),
        );
    }
}
