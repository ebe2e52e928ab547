// src/engine/handle.rs

//! Cloneable client side of the scheduler actor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::dag::NewMessage;
use crate::engine::ShutdownReport;
use crate::errors::{MsgschedError, Result};
use crate::types::MessageId;

/// Requests flowing into the scheduler's single merged inbox.
///
/// Submissions, booking notifications and shutdown share one channel so that
/// the actor handles them strictly in arrival order.
#[derive(Debug)]
pub enum SchedulerCommand {
    Submit {
        message: NewMessage,
        reply: oneshot::Sender<Result<()>>,
    },
    Booked {
        id: MessageId,
    },
    Shutdown {
        reply: oneshot::Sender<ShutdownReport>,
    },
}

/// Handle used by the ingestion stage and the booking oracle.
///
/// Cheap to clone; all clones talk to the same scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<SchedulerCommand>,
    closed: Arc<AtomicBool>,
}

impl SchedulerHandle {
    pub fn new(tx: mpsc::Sender<SchedulerCommand>) -> Self {
        Self {
            tx,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether shutdown has been requested through any clone of this handle.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }

    /// Submit a message, waiting for inbox space if necessary.
    ///
    /// Returns once the scheduler has accepted or rejected the message.
    pub async fn submit(&self, message: NewMessage) -> Result<()> {
        self.ensure_open()?;
        message.validate()?;

        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SchedulerCommand::Submit { message, reply })
            .await
            .map_err(|_| MsgschedError::Closed)?;

        rx.await.map_err(|_| MsgschedError::Closed)?
    }

    /// Like [`SchedulerHandle::submit`], but fails with
    /// [`MsgschedError::QueueFull`] instead of waiting for inbox space.
    pub async fn try_submit(&self, message: NewMessage) -> Result<()> {
        self.ensure_open()?;
        message.validate()?;

        let (reply, rx) = oneshot::channel();
        self.tx
            .try_send(SchedulerCommand::Submit { message, reply })
            .map_err(map_try_send_error)?;

        rx.await.map_err(|_| MsgschedError::Closed)?
    }

    /// Report that `id` has been booked.
    pub async fn notify_booked(&self, id: impl Into<MessageId>) -> Result<()> {
        self.ensure_open()?;
        let id = id.into();
        debug!(id = %id, "forwarding booking notification");
        self.tx
            .send(SchedulerCommand::Booked { id })
            .await
            .map_err(|_| MsgschedError::Closed)
    }

    /// Non-blocking variant of [`SchedulerHandle::notify_booked`].
    pub fn try_notify_booked(&self, id: impl Into<MessageId>) -> Result<()> {
        self.ensure_open()?;
        self.tx
            .try_send(SchedulerCommand::Booked { id: id.into() })
            .map_err(map_try_send_error)
    }

    /// Stop accepting input and drain the scheduler.
    ///
    /// Only the first call across all clones performs the shutdown; later
    /// calls fail with [`MsgschedError::Closed`].
    pub async fn shutdown(&self) -> Result<ShutdownReport> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(MsgschedError::Closed);
        }
        info!("shutdown requested");

        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SchedulerCommand::Shutdown { reply })
            .await
            .map_err(|_| MsgschedError::Closed)?;

        rx.await.map_err(|_| MsgschedError::Closed)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(MsgschedError::Closed)
        } else {
            Ok(())
        }
    }
}

fn map_try_send_error<T>(err: mpsc::error::TrySendError<T>) -> MsgschedError {
    match err {
        mpsc::error::TrySendError::Full(_) => MsgschedError::QueueFull,
        mpsc::error::TrySendError::Closed(_) => MsgschedError::Closed,
    }
}
