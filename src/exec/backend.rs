// src/exec/backend.rs

//! Pluggable dispatch sink abstraction.
//!
//! The runtime talks to a `DispatchSink` instead of a raw mpsc sender.
//! This makes it easy to swap in a recording sink in tests while keeping the
//! production outbox in [`super::outbox`].
//!
//! - `ChannelSink` is the default implementation. It pushes each released
//!   message into the bounded outbox channel, waiting for space, which is
//!   what gives the scheduler its backpressure.
//! - Tests can provide their own `DispatchSink` that, for example, records
//!   release order or refuses to accept anything.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::dag::Dispatched;
use crate::errors::{MsgschedError, Result};

/// Trait abstracting where released messages go.
pub trait DispatchSink: Send {
    /// Hand over `batch`, preserving its order.
    ///
    /// Implementations may block (asynchronously) until downstream has room;
    /// the scheduler loop stalls for as long as this future is pending.
    fn dispatch(
        &mut self,
        batch: Vec<Dispatched>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production sink: the producer side of the bounded outbox.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<Dispatched>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Dispatched>) -> Self {
        Self { tx }
    }
}

impl DispatchSink for ChannelSink {
    fn dispatch(
        &mut self,
        batch: Vec<Dispatched>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for message in batch {
                self.tx
                    .send(message)
                    .await
                    .map_err(|err| {
                        MsgschedError::Other(anyhow::anyhow!(
                            "outbox closed while dispatching '{}'",
                            err.0.id
                        ))
                    })?;
            }
            Ok(())
        })
    }
}
