use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use crate::stats::SharedAggregationStats;
use crate::worker::{AggregationReply, AggregationRequest, AggregationWorker, WorkerCommand};

/// Name of the aggregation worker thread. Panic hooks can use it to tell a
/// worker fault (absorbed by the worker's message loop) from a panic that
/// actually takes the process down.
pub const WORKER_THREAD_NAME: &str = "lichen-aggregation";

/// Cloneable send-only handle to the aggregation worker.
#[derive(Clone)]
pub struct CoreHandle {
    command_tx: Sender<WorkerCommand>,
}

impl CoreHandle {
    pub fn send(&self, command: WorkerCommand) -> Result<(), mpsc::SendError<WorkerCommand>> {
        self.command_tx.send(command)
    }

    pub fn send_request(
        &self,
        request: AggregationRequest,
    ) -> Result<(), mpsc::SendError<WorkerCommand>> {
        self.send(WorkerCommand::Request(request))
    }
}

/// Owns the worker thread and its channels. The reply receiver is handed out
/// once to whichever component polls it (the TUI event loop).
pub struct CoreRuntime {
    handle: CoreHandle,
    reply_rx: Option<Receiver<AggregationReply>>,
    worker_handle: Option<JoinHandle<()>>,
    stats: SharedAggregationStats,
}

impl CoreRuntime {
    pub fn new() -> Self {
        let (command_tx, command_rx) = mpsc::channel::<WorkerCommand>();
        let (reply_tx, reply_rx) = mpsc::channel::<AggregationReply>();

        let stats = SharedAggregationStats::new();
        let worker = AggregationWorker::new(command_rx, reply_tx, stats.clone());
        let worker_handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run())
            .expect("failed to spawn aggregation worker thread");

        Self {
            handle: CoreHandle { command_tx },
            reply_rx: Some(reply_rx),
            worker_handle: Some(worker_handle),
            stats,
        }
    }

    pub fn handle(&self) -> CoreHandle {
        self.handle.clone()
    }

    pub fn stats(&self) -> SharedAggregationStats {
        self.stats.clone()
    }

    pub fn take_reply_rx(&mut self) -> Option<Receiver<AggregationReply>> {
        self.reply_rx.take()
    }

    pub fn shutdown(&mut self) {
        let _ = self.handle.send(WorkerCommand::Shutdown);
        if let Some(worker_handle) = self.worker_handle.take() {
            let _ = worker_handle.join();
        }
    }
}

impl Default for CoreRuntime {
    fn default() -> Self {
        Self::new()
    }
}
