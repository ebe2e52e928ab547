use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Opaque, comparable message identifier.
///
/// Construction never fails; emptiness is checked when a message crosses the
/// submission boundary so that a malformed id cannot reach scheduler state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What happens to messages that are still blocked when the scheduler shuts
/// down.
///
/// - `Discard`: report them on the discard feed and drop them (default).
/// - `Release`: push them to the dispatch queue anyway, in
///   `(scheduled_time, arrival_sequence)` order, ignoring readiness.
///
/// Messages that are already ready are dispatched under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    Discard,
    Release,
}

impl Default for ShutdownPolicy {
    fn default() -> Self {
        ShutdownPolicy::Discard
    }
}

impl FromStr for ShutdownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Ok(ShutdownPolicy::Discard),
            "release" => Ok(ShutdownPolicy::Release),
            other => Err(format!(
                "invalid shutdown_policy: {other} (expected \"discard\" or \"release\")"
            )),
        }
    }
}

/// Policy for messages whose parents are never booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StallPolicy {
    /// Wait indefinitely.
    #[default]
    Wait,
    /// Evict a message that is still waiting on a parent this long after it
    /// was submitted.
    Evict(Duration),
}

/// Why a tracked message left the scheduler without being dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// A parent was not booked within the configured timeout.
    ParentTimeout,
    /// The scheduler shut down while the message was still blocked.
    Shutdown,
}

/// A message removed from the scheduler without being dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discarded {
    pub id: MessageId,
    pub reason: DiscardReason,
}
