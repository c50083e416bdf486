use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A notification the orchestrator wants delivered. Published to an
/// in-process queue and consumed by a worker; delivery is fire-and-forget
/// and its outcome never reaches the publisher.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationCommand {
    BookingConfirmation {
        recipient: String,
        booking_id: Uuid,
        total_price: Decimal,
    },
    PaymentConfirmation {
        recipient: String,
        booking_id: Uuid,
        amount: Decimal,
    },
}

impl NotificationCommand {
    pub fn recipient(&self) -> &str {
        match self {
            NotificationCommand::BookingConfirmation { recipient, .. } => recipient,
            NotificationCommand::PaymentConfirmation { recipient, .. } => recipient,
        }
    }
}

/// Delivery backend consumed by the notification worker. Retries and
/// failure handling are the sink's own concern.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(
        &self,
        command: &NotificationCommand,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
