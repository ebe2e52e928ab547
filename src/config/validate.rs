// src/config/validate.rs

use std::time::Duration;

use tokio::time::Instant;

use crate::config::model::{ConfigFile, RawConfigFile, SchedulerConfig, SchedulerSection};
use crate::errors::{MsgschedError, Result};
use crate::types::StallPolicy;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = MsgschedError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let scheduler = validate_scheduler_section(&raw.scheduler)?;
        Ok(ConfigFile { scheduler })
    }
}

fn validate_scheduler_section(section: &SchedulerSection) -> Result<SchedulerConfig> {
    ensure_positive("inbox_capacity", section.inbox_capacity)?;
    ensure_positive("outbox_capacity", section.outbox_capacity)?;
    ensure_positive("workers", section.workers)?;
    ensure_positive("booked_history", section.booked_history)?;

    let stall_policy = match section.parent_timeout.as_deref() {
        None => StallPolicy::Wait,
        Some(raw) => {
            let timeout = parse_duration(raw).map_err(|e| {
                MsgschedError::ConfigError(format!("[scheduler].parent_timeout: {e}"))
            })?;
            if timeout.is_zero() {
                return Err(MsgschedError::ConfigError(
                    "[scheduler].parent_timeout must be greater than zero".to_string(),
                ));
            }
            if Instant::now().checked_add(timeout).is_none() {
                return Err(MsgschedError::ConfigError(format!(
                    "[scheduler].parent_timeout {raw:?} is too large"
                )));
            }
            StallPolicy::Evict(timeout)
        }
    };

    Ok(SchedulerConfig {
        inbox_capacity: section.inbox_capacity,
        outbox_capacity: section.outbox_capacity,
        workers: section.workers,
        stall_policy,
        shutdown_policy: section.shutdown_policy,
        booked_history: section.booked_history,
    })
}

fn ensure_positive(key: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(MsgschedError::ConfigError(format!(
            "[scheduler].{key} must be >= 1 (got 0)"
        )));
    }
    Ok(())
}

/// Parse a duration like `"500ms"`, `"3s"`, `"2m"` or `"1h"`.
///
/// Values that do not fit in a [`Duration`] are rejected rather than
/// wrapped.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit (ms, s, m or h)"))?;
    let (digits, unit) = s.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration number '{digits}': {e}"))?;

    let secs_per_unit = match unit.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => {
            return Err(format!(
                "unsupported duration unit '{other}'; expected ms, s, m, or h"
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
