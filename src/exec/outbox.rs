// src/exec/outbox.rs

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::dag::Dispatched;
use crate::exec::backend::ChannelSink;

/// Create the bounded dispatch queue.
///
/// The scheduler owns the returned [`ChannelSink`]; workers share clones of
/// the [`Outbox`].
pub fn outbox(capacity: usize) -> (ChannelSink, Outbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ChannelSink::new(tx),
        Outbox {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Consumer side of the dispatch queue.
///
/// Any number of clones may call [`Outbox::recv`] concurrently; each message
/// is handed to exactly one of them, in the order the scheduler pushed it.
#[derive(Debug, Clone)]
pub struct Outbox {
    rx: Arc<Mutex<mpsc::Receiver<Dispatched>>>,
}

impl Outbox {
    /// Wait for the next released message.
    ///
    /// Returns `None` once the scheduler has shut down and the queue is empty.
    pub async fn recv(&self) -> Option<Dispatched> {
        self.rx.lock().await.recv().await
    }

    /// Take the next message if one is already queued.
    pub async fn try_recv(&self) -> Option<Dispatched> {
        self.rx.lock().await.try_recv().ok()
    }

    /// Collect everything until the queue closes.
    pub async fn collect_all(&self) -> Vec<Dispatched> {
        let mut all = Vec::new();
        while let Some(message) = self.recv().await {
            all.push(message);
        }
        all
    }
}
