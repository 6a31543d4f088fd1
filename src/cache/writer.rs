// src/cache/writer.rs
use super::{CacheStore, NewEntry};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 写入队列上限，超出时直接丢弃任务（只影响缓存，不影响响应）
pub const WRITE_QUEUE_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct WriteJob {
    pub key: String,
    pub entry: NewEntry,
}

/// Submit-and-forget handle for cache population. The request path never
/// waits on disk.
#[derive(Clone)]
pub struct CacheWriter {
    tx: Sender<WriteJob>,
}

impl CacheWriter {
    /// Starts the background worker. Must be called inside a tokio runtime.
    ///
    /// The worker exits once every `CacheWriter` clone is dropped and the
    /// queue is drained; await the handle to let queued writes finish.
    pub fn spawn(store: Arc<dyn CacheStore>) -> (Self, JoinHandle<()>) {
        Self::spawn_with_capacity(store, WRITE_QUEUE_CAPACITY)
    }

    pub fn spawn_with_capacity(store: Arc<dyn CacheStore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(store, rx));
        (Self { tx }, handle)
    }

    /// Returns `false` when the job was dropped.
    pub fn submit(&self, job: WriteJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                warn!("[CACHE ASYNC] Write queue full, dropping entry for {}", job.key);
                false
            }
            Err(TrySendError::Closed(job)) => {
                warn!("[CACHE ASYNC] Writer is gone, dropping entry for {}", job.key);
                false
            }
        }
    }
}

async fn run_worker(store: Arc<dyn CacheStore>, mut rx: Receiver<WriteJob>) {
    while let Some(job) = rx.recv().await {
        if let Err(e) = store.write(&job.key, job.entry).await {
            warn!("[CACHE ASYNC] Failed to save to cache {}: {}", job.key, e);
        }
    }
    debug!("[CACHE ASYNC] Writer stopped");
}
