//! Serial FIFO queue for network-bound tasks
//!
//! One worker loop drains the queue, so at most one task is ever in flight.
//! Before each task the worker waits one pacing interval; since the worker
//! lives as long as the queue, pacing carries over between batches.

use super::pacing::Pacing;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

type QueuedTask = BoxFuture<'static, ()>;

/// FIFO task queue with a single consuming worker
///
/// Tasks are expected to handle their own errors. A task that panics is
/// logged and the queue moves on to the next one.
#[derive(Clone)]
pub struct SerialFetchQueue {
    tx: mpsc::UnboundedSender<QueuedTask>,
    outstanding: Arc<watch::Sender<usize>>,
}

impl SerialFetchQueue {
    /// Create the queue and spawn its worker (requires a tokio runtime)
    pub fn new(pacing: Pacing) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (outstanding, _) = watch::channel(0usize);
        let outstanding = Arc::new(outstanding);

        tokio::spawn(run_worker(rx, pacing, Arc::clone(&outstanding)));

        Self { tx, outstanding }
    }

    /// Append a task; it runs after every previously enqueued task finished
    pub fn enqueue<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.outstanding.send_modify(|count| *count += 1);

        if self.tx.send(Box::pin(task)).is_err() {
            // Worker gone (runtime shutting down); the dropped task runs
            // its cleanup through Drop.
            warn!("Fetch queue worker stopped, task dropped");
            self.outstanding
                .send_modify(|count| *count = count.saturating_sub(1));
        }
    }

    /// Tasks enqueued but not yet finished (including the running one)
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Resolve once every enqueued task has finished
    pub async fn wait_idle(&self) {
        let mut rx = self.outstanding.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<QueuedTask>,
    pacing: Pacing,
    outstanding: Arc<watch::Sender<usize>>,
) {
    debug!("Fetch queue worker started");

    while let Some(task) = rx.recv().await {
        pacing.wait().await;

        // Spawned so a panicking task cannot take the worker down with it
        if let Err(e) = tokio::spawn(task).await {
            if e.is_panic() {
                error!("Queued fetch task panicked: {}", e);
            }
        }

        outstanding.send_modify(|count| *count = count.saturating_sub(1));
    }

    debug!("Fetch queue worker stopped");
}
