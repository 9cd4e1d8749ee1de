//! Background aggregation worker.
//!
//! One long-lived thread per external-accordion panel. The worker keeps the
//! last external dataset it was sent and answers selection changes from that
//! cache, so navigation only ships a resource id instead of the full tables.
//! The cache may lag the store until the next refresh message arrives; the
//! UI side tolerates that and falls back to a synchronous computation when
//! the worker signals a cold cache.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, Sender};

use crate::containment::{
    get_contained_external_packages, AttributionIdWithCount, PanelAttributionData,
};
use crate::models::{AttributionId, ResourceId};
use crate::stats::SharedAggregationStats;

/// Cache instruction carried by a request: leave the cached dataset alone,
/// replace it, or drop it (the wire format's absent / value / null).
#[derive(Debug, Clone, Default)]
pub enum CacheUpdate {
    #[default]
    Keep,
    Replace(PanelAttributionData),
    Clear,
}

/// One request message. A message with `selected_resource_id: None` only
/// updates the cache and produces no reply.
#[derive(Debug, Clone, Default)]
pub struct AggregationRequest {
    pub selected_resource_id: Option<ResourceId>,
    pub external_data: CacheUpdate,
    pub resolved_external_attributions: Option<HashSet<AttributionId>>,
    /// Test-only seam: makes `handle_request` panic so the recovery path
    /// (cache cleared, thread survives) can be exercised.
    #[cfg(test)]
    pub(crate) inject_fault: bool,
}

impl AggregationRequest {
    /// Cache-refresh-only message (no reply expected).
    pub fn refresh(data: PanelAttributionData) -> Self {
        Self {
            external_data: CacheUpdate::Replace(data),
            ..Default::default()
        }
    }

    /// Selection-change message answered from the cached dataset.
    pub fn query(
        selected_resource_id: ResourceId,
        resolved_external_attributions: HashSet<AttributionId>,
    ) -> Self {
        Self {
            selected_resource_id: Some(selected_resource_id),
            external_data: CacheUpdate::Keep,
            resolved_external_attributions: Some(resolved_external_attributions),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub enum WorkerCommand {
    Request(AggregationRequest),
    Shutdown,
}

/// Aggregation result echoed back with the resource id it was computed for,
/// so the receiver can discard replies superseded by a newer selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainedAttributionsOutput {
    pub resource_id: ResourceId,
    pub attribution_ids_with_count: Vec<AttributionIdWithCount>,
}

/// Reply message. `output: None` signals a cold cache: the worker has not
/// been seeded yet and the caller should compute synchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationReply {
    pub output: Option<ContainedAttributionsOutput>,
}

pub struct AggregationWorker {
    command_rx: Receiver<WorkerCommand>,
    reply_tx: Sender<AggregationReply>,
    stats: SharedAggregationStats,
    cached_external_data: Option<PanelAttributionData>,
}

impl AggregationWorker {
    pub fn new(
        command_rx: Receiver<WorkerCommand>,
        reply_tx: Sender<AggregationReply>,
        stats: SharedAggregationStats,
    ) -> Self {
        Self {
            command_rx,
            reply_tx,
            stats,
            cached_external_data: None,
        }
    }

    /// Message loop. Runs until `Shutdown` arrives or the command channel
    /// closes. A panic while handling a single message degrades the worker
    /// to a cold cache instead of killing the thread.
    pub fn run(mut self) {
        tracing::debug!("aggregation worker started");
        while let Ok(command) = self.command_rx.recv() {
            match command {
                WorkerCommand::Request(request) => {
                    let handled =
                        catch_unwind(AssertUnwindSafe(|| self.handle_request(request)));
                    if handled.is_err() {
                        tracing::warn!(
                            "aggregation worker fault while handling request; clearing cache"
                        );
                        self.cached_external_data = None;
                    }
                }
                WorkerCommand::Shutdown => break,
            }
        }
        tracing::debug!("aggregation worker stopped");
    }

    fn handle_request(&mut self, request: AggregationRequest) {
        #[cfg(test)]
        if request.inject_fault {
            panic!("injected fault");
        }

        match request.external_data {
            CacheUpdate::Keep => {}
            CacheUpdate::Replace(data) => {
                self.stats.record_cache_refresh();
                self.cached_external_data = Some(data);
            }
            CacheUpdate::Clear => {
                self.cached_external_data = None;
            }
        }

        // A message without a selection served purely to update the cache.
        let Some(selected_resource_id) = request.selected_resource_id else {
            return;
        };
        self.stats.record_request();

        let reply = match &self.cached_external_data {
            Some(external_data) => {
                let attribution_ids_with_count = get_contained_external_packages(
                    &selected_resource_id,
                    external_data,
                    request.resolved_external_attributions.as_ref(),
                );
                AggregationReply {
                    output: Some(ContainedAttributionsOutput {
                        resource_id: selected_resource_id,
                        attribution_ids_with_count,
                    }),
                }
            }
            None => {
                self.stats.record_cold_miss();
                AggregationReply { output: None }
            }
        };

        if self.reply_tx.send(reply).is_err() {
            // Receiver side is gone; nothing left to serve.
            tracing::debug!("aggregation reply channel closed");
        } else {
            self.stats.record_reply();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containment::attributed_children_index;
    use crate::models::ResourcesToAttributions;
    use std::sync::mpsc;

    fn external_data() -> PanelAttributionData {
        let mut mapping = ResourcesToAttributions::new();
        mapping.insert("/a/b/file1".to_string(), vec!["x".to_string()]);
        mapping.insert("/a/file2".to_string(), vec!["y".to_string()]);
        let resources_with_attributed_children = attributed_children_index(&mapping);
        PanelAttributionData {
            attributions: Default::default(),
            resources_to_attributions: mapping,
            resources_with_attributed_children,
        }
    }

    struct Harness {
        command_tx: Sender<WorkerCommand>,
        reply_rx: Receiver<AggregationReply>,
        handle: std::thread::JoinHandle<()>,
    }

    fn spawn_worker() -> Harness {
        let (command_tx, command_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        let worker =
            AggregationWorker::new(command_rx, reply_tx, SharedAggregationStats::new());
        let handle = std::thread::spawn(move || worker.run());
        Harness {
            command_tx,
            reply_rx,
            handle,
        }
    }

    impl Harness {
        fn send(&self, request: AggregationRequest) {
            self.command_tx
                .send(WorkerCommand::Request(request))
                .unwrap();
        }

        fn shutdown(self) {
            self.command_tx.send(WorkerCommand::Shutdown).unwrap();
            self.handle.join().unwrap();
        }
    }

    #[test]
    fn test_cold_cache_replies_null() {
        let harness = spawn_worker();
        harness.send(AggregationRequest::query("/a/".to_string(), HashSet::new()));
        let reply = harness.reply_rx.recv().unwrap();
        assert_eq!(reply.output, None);
        harness.shutdown();
    }

    #[test]
    fn test_refresh_only_message_sends_no_reply() {
        let harness = spawn_worker();
        harness.send(AggregationRequest::refresh(external_data()));
        harness.send(AggregationRequest::query("/a/b/".to_string(), HashSet::new()));
        // Only the query produces a reply; it reflects the seeded cache.
        let reply = harness.reply_rx.recv().unwrap();
        let output = reply.output.unwrap();
        assert_eq!(output.resource_id, "/a/b/");
        assert_eq!(output.attribution_ids_with_count.len(), 1);
        assert_eq!(output.attribution_ids_with_count[0].attribution_id, "x");
        assert!(harness.reply_rx.try_recv().is_err());
        harness.shutdown();
    }

    #[test]
    fn test_seeding_twice_is_idempotent() {
        let harness = spawn_worker();
        harness.send(AggregationRequest::refresh(external_data()));
        harness.send(AggregationRequest::query("/a/".to_string(), HashSet::new()));
        let once = harness.reply_rx.recv().unwrap();

        harness.send(AggregationRequest::refresh(external_data()));
        harness.send(AggregationRequest::query("/a/".to_string(), HashSet::new()));
        let twice = harness.reply_rx.recv().unwrap();

        assert_eq!(once, twice);
        harness.shutdown();
    }

    #[test]
    fn test_clear_returns_worker_to_cold_state() {
        let harness = spawn_worker();
        harness.send(AggregationRequest::refresh(external_data()));
        harness.send(AggregationRequest {
            selected_resource_id: Some("/a/".to_string()),
            external_data: CacheUpdate::Clear,
            ..Default::default()
        });
        // The clear is applied before the query is answered.
        let reply = harness.reply_rx.recv().unwrap();
        assert_eq!(reply.output, None);
        harness.shutdown();
    }

    #[test]
    fn test_fault_clears_cache_and_worker_survives() {
        let harness = spawn_worker();
        harness.send(AggregationRequest::refresh(external_data()));
        harness.send(AggregationRequest {
            inject_fault: true,
            ..Default::default()
        });

        // The cache was dropped on recovery, so a query now reports cold.
        harness.send(AggregationRequest::query("/a/".to_string(), HashSet::new()));
        let reply = harness.reply_rx.recv().unwrap();
        assert_eq!(reply.output, None);

        // The thread is still serving: a reseed warms it back up.
        harness.send(AggregationRequest::refresh(external_data()));
        harness.send(AggregationRequest::query("/a/".to_string(), HashSet::new()));
        let reply = harness.reply_rx.recv().unwrap();
        assert_eq!(reply.output.unwrap().attribution_ids_with_count.len(), 2);
        harness.shutdown();
    }

    #[test]
    fn test_resolved_attributions_respected_per_request() {
        let harness = spawn_worker();
        harness.send(AggregationRequest::refresh(external_data()));

        let resolved: HashSet<AttributionId> = ["x".to_string()].into_iter().collect();
        harness.send(AggregationRequest::query("/a/".to_string(), resolved));
        let reply = harness.reply_rx.recv().unwrap();
        let output = reply.output.unwrap();
        assert_eq!(output.attribution_ids_with_count.len(), 1);
        assert_eq!(output.attribution_ids_with_count[0].attribution_id, "y");

        // The cache itself is untouched: a follow-up query without the
        // resolved set sees both attributions again.
        harness.send(AggregationRequest::query("/a/".to_string(), HashSet::new()));
        let reply = harness.reply_rx.recv().unwrap();
        assert_eq!(reply.output.unwrap().attribution_ids_with_count.len(), 2);
        harness.shutdown();
    }
}
