// src/exec/worker_pool.rs

//! Downstream consumers of the dispatch queue.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::dag::Dispatched;
use crate::errors::Result;
use crate::exec::outbox::Outbox;

/// Processing applied to each released message.
pub trait MessageHandler: Send + Sync + 'static {
    fn handle(
        &self,
        message: Dispatched,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// A fixed set of Tokio tasks draining an [`Outbox`].
///
/// Workers exit when the outbox closes (after scheduler shutdown) and is
/// empty. A failing handler is logged and does not stop its worker.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn<H: MessageHandler>(workers: usize, outbox: Outbox, handler: Arc<H>) -> Self {
        let workers = (0..workers.max(1))
            .map(|worker| {
                let outbox = outbox.clone();
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    debug!(worker, "dispatch worker started");
                    while let Some(message) = outbox.recv().await {
                        let id = message.id.clone();
                        if let Err(err) = handler.handle(message).await {
                            error!(worker, id = %id, error = %err, "message handler failed");
                        }
                    }
                    debug!(worker, "dispatch worker finished (outbox closed)");
                })
            })
            .collect();

        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every worker to finish.
    pub async fn join(self) {
        let count = self.workers.len();
        for worker in self.workers {
            if let Err(err) = worker.await {
                error!(error = %err, "dispatch worker panicked or was cancelled");
            }
        }
        info!(workers = count, "all dispatch workers finished");
    }
}
