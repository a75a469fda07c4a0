use super::{MessageTransport, Notification, TransportResponse};
use crate::error::TransportError;

/// Used when sending is switched off: logs the message and reports success,
/// so the rest of the run (store inserts, counts) behaves as if it went out.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunTransport;

#[async_trait::async_trait]
impl MessageTransport for DryRunTransport {
    async fn send(&self, notification: &Notification) -> Result<TransportResponse, TransportError> {
        tracing::info!(
            thread = notification.thread_id.as_deref().unwrap_or("-"),
            "dry run, not sent:\n{}",
            notification.text
        );
        Ok(TransportResponse::with_status(200))
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
