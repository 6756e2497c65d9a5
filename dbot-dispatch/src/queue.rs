//! Bounded update queue drained by a fixed worker pool.
//!
//! Updates are sharded by chat id: each worker owns one bounded channel and the shard for an
//! update is `chat_id mod workers`. Updates of one chat are therefore processed serially and
//! in enqueue order, whatever the worker count; with one worker the whole queue is FIFO.
//!
//! Shutdown is cooperative through a [`CancellationToken`]: [`DispatchQueue::stop`] cancels it,
//! idle workers and blocked [`DispatchQueue::enqueue`] calls observe it promptly, and a worker
//! finishes the item it is processing before exiting. Items still queued are discarded.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use dbot_core::Update;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consumer of dequeued updates. Called synchronously inside a worker; a slow call blocks
/// that worker's shard.
#[async_trait]
pub trait UpdateProcessor: Send + Sync {
    async fn process(&self, update: Update);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchQueueConfig {
    /// Worker count (clamped to at least 1).
    pub workers: usize,
    /// Total queue capacity, split across workers. Each shard holds
    /// `ceil(queue_size / workers)` items and at least 1, so the effective total can exceed
    /// `queue_size` by up to `workers - 1`.
    pub queue_size: usize,
}

impl Default for DispatchQueueConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_size: 100,
        }
    }
}

type SharedProcessor = Arc<RwLock<Option<Arc<dyn UpdateProcessor>>>>;

pub struct DispatchQueue {
    senders: Vec<mpsc::Sender<Update>>,
    receivers: Mutex<Vec<mpsc::Receiver<Update>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    processor: SharedProcessor,
    shutdown: CancellationToken,
}

impl DispatchQueue {
    pub fn new(config: DispatchQueueConfig) -> Self {
        let workers = config.workers.max(1);
        let shard_size = config.queue_size.div_ceil(workers).max(1);
        let (senders, receivers) = (0..workers).map(|_| mpsc::channel(shard_size)).unzip();
        Self {
            senders,
            receivers: Mutex::new(receivers),
            workers: Mutex::new(Vec::new()),
            processor: Arc::new(RwLock::new(None)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    /// Sets the consumer. Items dequeued while no processor is set are dropped.
    pub fn set_processor(&self, processor: Arc<dyn UpdateProcessor>) {
        *self.processor.write().unwrap_or_else(PoisonError::into_inner) = Some(processor);
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Spawns the workers on the current tokio runtime. Calling it again, or after
    /// [`stop`](Self::stop), does nothing.
    pub fn start(&self) {
        if self.is_stopped() {
            warn!("DispatchQueue::start called after stop; ignoring");
            return;
        }
        let receivers: Vec<_> = self
            .receivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if receivers.is_empty() {
            warn!("DispatchQueue already started");
            return;
        }

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        for (worker, rx) in receivers.into_iter().enumerate() {
            let processor = self.processor.clone();
            let shutdown = self.shutdown.clone();
            workers.push(tokio::spawn(run_worker(worker, rx, processor, shutdown)));
        }
        info!(workers = workers.len(), "Dispatch queue started");
    }

    /// Queues `update` on its chat's shard, waiting while the shard is full.
    ///
    /// Returns immediately, dropping the update, once shutdown has been signaled; a wait
    /// for room is abandoned the same way if shutdown happens concurrently.
    pub async fn enqueue(&self, update: Update) {
        if self.shutdown.is_cancelled() {
            debug!(chat_id = update.chat_id(), "Queue stopped; update dropped");
            return;
        }
        let shard = self.shard_for(update.chat_id());
        let chat_id = update.chat_id();
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                debug!(chat_id, "Queue stopped while waiting for room; update dropped");
            }
            sent = self.senders[shard].send(update) => {
                if sent.is_err() {
                    debug!(chat_id, shard, "Shard closed; update dropped");
                }
            }
        }
    }

    /// Signals shutdown and waits for every worker to finish its current item and exit.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        // Never-started receivers are dropped so their channels close too.
        self.receivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        let handles: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Dispatch worker ended abnormally");
            }
        }
        info!("Dispatch queue stopped");
    }

    fn shard_for(&self, chat_id: i64) -> usize {
        chat_id.rem_euclid(self.senders.len() as i64) as usize
    }
}

async fn run_worker(
    worker: usize,
    mut rx: mpsc::Receiver<Update>,
    processor: SharedProcessor,
    shutdown: CancellationToken,
) {
    debug!(worker, "Dispatch worker started");
    loop {
        let update = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = rx.recv() => match next {
                Some(update) => update,
                None => break,
            },
        };

        let current = processor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match current {
            Some(p) => p.process(update).await,
            None => warn!(worker, chat_id = update.chat_id(), "No processor set; update dropped"),
        }
    }
    rx.close();
    debug!(worker, "Dispatch worker exited");
}
