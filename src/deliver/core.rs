use std::fmt;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// What kind of result the page is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Ai,
    Regex,
    Decode,
    Error,
}

/// The message relayed to the page for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "SHOW_RESULT", rename_all = "camelCase")]
pub struct ResultMessage {
    pub result: String,
    pub result_type: ResultKind,
}

impl ResultMessage {
    pub fn new(result: impl Into<String>, result_type: ResultKind) -> Self {
        Self {
            result: result.into(),
            result_type,
        }
    }

    pub fn decode(result: impl Into<String>) -> Self {
        Self::new(result, ResultKind::Decode)
    }

    pub fn error(result: impl Into<String>) -> Self {
        Self::new(result, ResultKind::Error)
    }
}

/// A channel that can hand a result to whoever displays it.
pub trait Deliver {
    type Error: fmt::Display;

    fn deliver(&mut self, msg: &ResultMessage) -> Result<(), Self::Error>;
}

/// How hard to try before giving up on a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub fn once() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Error)]
#[error("delivery failed after {attempts} attempt(s): {last}")]
pub struct DeliveryError<E: fmt::Display + fmt::Debug> {
    pub attempts: u32,
    pub last: E,
}

/// Try to deliver `msg` up to `policy.attempts` times, sleeping
/// `policy.delay` between attempts. Returns the last error if every attempt
/// fails. A policy of zero attempts still tries once.
pub fn deliver_with_retry<D>(
    sink: &mut D,
    msg: &ResultMessage,
    policy: RetryPolicy,
) -> Result<(), DeliveryError<D::Error>>
where
    D: Deliver,
    D::Error: fmt::Debug,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match sink.deliver(msg) {
            Ok(()) => {
                debug!(attempt, "result delivered");
                return Ok(());
            }
            Err(e) if attempt >= attempts => {
                warn!(attempt, error = %e, "giving up on delivery");
                return Err(DeliveryError { attempts, last: e });
            }
            Err(e) => {
                warn!(attempt, error = %e, "delivery attempt failed, retrying");
                if !policy.delay.is_zero() {
                    thread::sleep(policy.delay);
                }
                attempt += 1;
            }
        }
    }
}

/// Writes each message as one JSON object per line.
pub struct JsonLineSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Deliver for JsonLineSink<W> {
    type Error = io::Error;

    fn deliver(&mut self, msg: &ResultMessage) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, msg)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}
