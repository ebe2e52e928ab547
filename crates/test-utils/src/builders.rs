#![allow(dead_code)]

use std::time::Duration;

use msgsched::config::SchedulerConfig;
use msgsched::dag::NewMessage;
use msgsched::types::{MessageId, ShutdownPolicy, StallPolicy};
use tokio::time::Instant;

/// Builder for `NewMessage` with times expressed relative to a base instant.
pub struct MessageBuilder {
    message: NewMessage,
    base: Instant,
}

impl MessageBuilder {
    /// A message due exactly at `base` with no parents and weight 1.
    pub fn new(id: &str, base: Instant) -> Self {
        Self {
            message: NewMessage::new(id, base).with_weight(1),
            base,
        }
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.message.parent_ids.push(MessageId::from(parent));
        self
    }

    pub fn parents(mut self, parents: &[&str]) -> Self {
        for p in parents {
            self = self.parent(p);
        }
        self
    }

    /// Due `delay` after the base instant.
    pub fn due_in(mut self, delay: Duration) -> Self {
        self.message.scheduled_time = self.base + delay;
        self
    }

    /// Due `ago` before the base instant.
    pub fn overdue_by(mut self, ago: Duration) -> Self {
        self.message.scheduled_time = self.base - ago;
        self
    }

    pub fn weight(mut self, weight: u64) -> Self {
        self.message.weight = weight;
        self
    }

    pub fn build(self) -> NewMessage {
        self.message
    }
}

/// Builder for `SchedulerConfig`, starting from the defaults.
pub struct SchedulerConfigBuilder {
    config: SchedulerConfig,
}

impl SchedulerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    pub fn inbox_capacity(mut self, n: usize) -> Self {
        self.config.inbox_capacity = n;
        self
    }

    pub fn outbox_capacity(mut self, n: usize) -> Self {
        self.config.outbox_capacity = n;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n;
        self
    }

    pub fn parent_timeout(mut self, timeout: Duration) -> Self {
        self.config.stall_policy = StallPolicy::Evict(timeout);
        self
    }

    pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.config.shutdown_policy = policy;
        self
    }

    pub fn booked_history(mut self, n: usize) -> Self {
        self.config.booked_history = n;
        self
    }

    pub fn build(self) -> SchedulerConfig {
        self.config
    }
}

impl Default for SchedulerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
