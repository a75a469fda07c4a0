//! Reliable delivery: bounded retries with backoff on rate limiting.
//!
//! Per invocation the engine runs `Sending -> {Delivered, Retry, Exhausted}`:
//! - 2xx: delivered.
//! - 429: wait `base^retry_count * unit` (at least the server's
//!   `retry_after`, never less than the previous rate-limit wait), retry.
//! - timeout / connect failure / 5xx: wait `retry_delay`, retry.
//! - any other status: exhausted at once, the request itself is wrong.
//!
//! Every failure bumps the retry counter; reaching `max_retries` ends the
//! invocation as exhausted without a final sleep. Exhausted messages are
//! logged and dropped for this run.

use std::fmt;
use std::time::Duration;

use metrics::counter;

use super::{MessageTransport, Notification, TransportResponse};
use crate::error::TransportError;
use crate::telemetry::{DELIVERED, EXHAUSTED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryConfig {
    pub max_retries: u32,
    pub backoff_base: u32,
    pub backoff_unit: Duration,
    pub retry_delay: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base: 2,
            backoff_unit: Duration::from_secs(1),
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Classified failure of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    RateLimited { retry_after: Option<Duration> },
    Transport(TransportError),
    Server { status: u16 },
    Rejected { status: u16, description: Option<String> },
}

impl AttemptError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttemptError::Rejected { .. })
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::RateLimited { .. } => write!(f, "rate limited (429)"),
            AttemptError::Transport(e) => write!(f, "transport error: {e}"),
            AttemptError::Server { status } => write!(f, "server error ({status})"),
            AttemptError::Rejected {
                status,
                description,
            } => write!(
                f,
                "rejected ({status}): {}",
                description.as_deref().unwrap_or("no description")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Exhausted { attempts: u32, last_error: AttemptError },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// `base^retry_count` units, saturating instead of overflowing.
pub fn rate_limit_backoff(cfg: &DeliveryConfig, retry_count: u32) -> Duration {
    let factor = cfg.backoff_base.saturating_pow(retry_count);
    cfg.backoff_unit.saturating_mul(factor)
}

pub fn classify(result: Result<TransportResponse, TransportError>) -> Result<(), AttemptError> {
    let resp = result.map_err(AttemptError::Transport)?;
    match resp.status {
        200..=299 => Ok(()),
        429 => Err(AttemptError::RateLimited {
            retry_after: resp.retry_after,
        }),
        500..=599 => Err(AttemptError::Server {
            status: resp.status,
        }),
        status => Err(AttemptError::Rejected {
            status,
            description: resp.description,
        }),
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryEngine {
    cfg: DeliveryConfig,
}

impl DeliveryEngine {
    pub fn new(cfg: DeliveryConfig) -> Self {
        Self { cfg }
    }

    pub async fn deliver(
        &self,
        notification: &Notification,
        transport: &dyn MessageTransport,
    ) -> DeliveryOutcome {
        let max = self.cfg.max_retries.max(1);
        let mut retry_count: u32 = 0;
        let mut last_rate_limit_wait = Duration::ZERO;

        loop {
            let attempt = retry_count + 1;
            let err = match classify(transport.send(notification).await) {
                Ok(()) => {
                    counter!(DELIVERED).increment(1);
                    tracing::debug!(
                        transport = transport.name(),
                        thread = notification.thread_id.as_deref().unwrap_or("-"),
                        attempt,
                        "message delivered"
                    );
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(e) => e,
            };

            let wait = match &err {
                AttemptError::RateLimited { retry_after } => {
                    let wait = rate_limit_backoff(&self.cfg, retry_count)
                        .max(retry_after.unwrap_or_default())
                        .max(last_rate_limit_wait);
                    last_rate_limit_wait = wait;
                    wait
                }
                _ => self.cfg.retry_delay,
            };
            retry_count += 1;

            if !err.is_retryable() || retry_count >= max {
                counter!(EXHAUSTED).increment(1);
                tracing::warn!(
                    transport = transport.name(),
                    attempts = attempt,
                    error = %err,
                    "delivery exhausted, message dropped for this run"
                );
                return DeliveryOutcome::Exhausted {
                    attempts: attempt,
                    last_error: err,
                };
            }

            tracing::warn!(
                transport = transport.name(),
                attempt,
                max_retries = max,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "send failed, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }
}
