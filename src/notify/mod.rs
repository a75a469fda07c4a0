// src/notify/mod.rs
pub mod delivery;
pub mod dry_run;
pub mod proxy;
pub mod telegram;

use std::time::Duration;

use serde::Serialize;

use crate::error::TransportError;

pub use delivery::{AttemptError, DeliveryConfig, DeliveryEngine, DeliveryOutcome};
pub use dry_run::DryRunTransport;
pub use telegram::TelegramTransport;

/// Text plus the forum thread it goes to. `thread_id == None` posts to the
/// chat's general topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub text: String,
    pub thread_id: Option<String>,
}

/// What came back from one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    pub status: u16,
    /// Server-suggested wait, if the response carried one.
    pub retry_after: Option<Duration>,
    pub description: Option<String>,
}

impl TransportResponse {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

/// One network send per call. Retrying is the delivery engine's job.
#[async_trait::async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<TransportResponse, TransportError>;

    fn name(&self) -> &'static str;
}
