// src/exec/mod.rs

//! Dispatch layer.
//!
//! This module is responsible for handing released messages to downstream
//! processing.
//!
//! - [`backend`] provides the `DispatchSink` trait the runtime pushes into,
//!   and the production `ChannelSink`.
//! - [`outbox`] builds the bounded dispatch queue and its multi-consumer
//!   `Outbox` side.
//! - [`worker_pool`] runs a configurable number of workers over the outbox.

pub mod backend;
pub mod outbox;
pub mod worker_pool;

pub use backend::{ChannelSink, DispatchSink};
pub use outbox::{Outbox, outbox};
pub use worker_pool::{MessageHandler, WorkerPool};
