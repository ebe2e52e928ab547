// src/input.rs

//! Line protocol used by `msgsched run` on stdin.
//!
//! ```text
//! submit <id> [parents=a,b] [delay=5s] [weight=N]
//! booked <id>
//! shutdown
//! ```
//!
//! `delay` is relative to the moment the line is read and may be negative
//! (`delay=-1s`) to submit a message whose release time has already passed.
//! Blank lines and lines starting with `#` are ignored.

use tokio::time::Instant;

use crate::config::parse_duration;
use crate::dag::NewMessage;
use crate::errors::{MsgschedError, Result};
use crate::types::MessageId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Submit(NewMessage),
    Booked(MessageId),
    Shutdown,
}

/// Parse one input line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str, now: Instant) -> Result<Option<InputCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_lowercase();

    let command = match verb.as_str() {
        "submit" => {
            let id = words
                .next()
                .ok_or_else(|| invalid(line, "submit needs an id"))?;
            let mut message = NewMessage::new(id, now);
            for option in words {
                apply_submit_option(&mut message, option, now).map_err(|e| invalid(line, &e))?;
            }
            InputCommand::Submit(message)
        }
        "booked" => {
            let id = words
                .next()
                .ok_or_else(|| invalid(line, "booked needs an id"))?;
            InputCommand::Booked(MessageId::from(id))
        }
        "shutdown" => InputCommand::Shutdown,
        other => return Err(invalid(line, &format!("unknown command '{other}'"))),
    };

    Ok(Some(command))
}

fn apply_submit_option(
    message: &mut NewMessage,
    option: &str,
    now: Instant,
) -> std::result::Result<(), String> {
    let (key, value) = option
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{option}'"))?;

    match key {
        "parents" => {
            message.parent_ids = value
                .split(',')
                .filter(|p| !p.is_empty())
                .map(MessageId::from)
                .collect();
        }
        "delay" => {
            message.scheduled_time = match value.strip_prefix('-') {
                Some(past) => {
                    let delay = parse_duration(past)?;
                    now.checked_sub(delay).unwrap_or(now)
                }
                None => {
                    let delay = parse_duration(value)?;
                    now.checked_add(delay)
                        .ok_or_else(|| format!("delay '{value}' is too far in the future"))?
                }
            };
        }
        "weight" => {
            message.weight = value
                .parse()
                .map_err(|e| format!("invalid weight '{value}': {e}"))?;
        }
        other => return Err(format!("unknown option '{other}'")),
    }
    Ok(())
}

fn invalid(line: &str, reason: &str) -> MsgschedError {
    MsgschedError::InvalidMessage(format!("{reason} (in line '{line}')"))
}
