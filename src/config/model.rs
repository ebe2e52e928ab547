// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::dag::SchedulerOptions;
use crate::dag::scheduler::DEFAULT_BOOKED_HISTORY;
use crate::types::{ShutdownPolicy, StallPolicy};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [scheduler]
/// inbox_capacity = 1024
/// outbox_capacity = 256
/// workers = 4
/// parent_timeout = "30s"
/// shutdown_policy = "discard"
/// booked_history = 65536
/// ```
///
/// All sections and keys are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,
}

/// `[scheduler]` section, as written by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSection {
    /// Bound of the merged submission/booking inbox.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,

    /// Bound of the dispatch queue handed to workers.
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,

    /// Number of downstream consumer workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Duration string (e.g. `"30s"`). When set, a message still waiting on
    /// a parent this long after submission is evicted. When absent, such
    /// messages wait indefinitely.
    #[serde(default)]
    pub parent_timeout: Option<String>,

    /// `"discard"` (default) or `"release"`.
    #[serde(default)]
    pub shutdown_policy: ShutdownPolicy,

    /// How many booked ids to remember for dependents that arrive later.
    /// Also caps how many released ids are remembered for duplicate checks.
    #[serde(default = "default_booked_history")]
    pub booked_history: usize,
}

fn default_inbox_capacity() -> usize {
    1024
}

fn default_outbox_capacity() -> usize {
    256
}

fn default_workers() -> usize {
    4
}

fn default_booked_history() -> usize {
    DEFAULT_BOOKED_HISTORY
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            inbox_capacity: default_inbox_capacity(),
            outbox_capacity: default_outbox_capacity(),
            workers: default_workers(),
            parent_timeout: None,
            shutdown_policy: ShutdownPolicy::default(),
            booked_history: default_booked_history(),
        }
    }
}

/// Validated configuration. Build it from a [`RawConfigFile`] via
/// `TryFrom`, or through [`crate::config::load_and_validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub scheduler: SchedulerConfig,
}

/// Validated scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub inbox_capacity: usize,
    pub outbox_capacity: usize,
    pub workers: usize,
    pub stall_policy: StallPolicy,
    pub shutdown_policy: ShutdownPolicy,
    pub booked_history: usize,
}

impl SchedulerConfig {
    pub fn options(&self) -> SchedulerOptions {
        SchedulerOptions {
            stall_policy: self.stall_policy,
            booked_history: self.booked_history,
        }
    }

    pub fn with_parent_timeout(mut self, timeout: Duration) -> Self {
        self.stall_policy = StallPolicy::Evict(timeout);
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: default_inbox_capacity(),
            outbox_capacity: default_outbox_capacity(),
            workers: default_workers(),
            stall_policy: StallPolicy::Wait,
            shutdown_policy: ShutdownPolicy::default(),
            booked_history: default_booked_history(),
        }
    }
}
