use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info};

use stayline_core::notify::{NotificationCommand, NotificationSink};

/// Email-shaped sink. Composes the confirmation messages and hands them to
/// the mail transport; this build logs the delivery, a production build
/// would plug an SMTP/provider sink in behind the same trait.
pub struct EmailNotifier {
    from_email: String,
}

impl EmailNotifier {
    pub fn new(from_email: String) -> Self {
        Self { from_email }
    }
}

#[async_trait]
impl NotificationSink for EmailNotifier {
    async fn deliver(
        &self,
        command: &NotificationCommand,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (subject, body) = match command {
            NotificationCommand::BookingConfirmation {
                booking_id,
                total_price,
                ..
            } => (
                "Booking Confirmation",
                format!(
                    "Your booking has been successfully created.\nBooking ID: {}\nTotal Price: {}",
                    booking_id, total_price
                ),
            ),
            NotificationCommand::PaymentConfirmation {
                booking_id, amount, ..
            } => (
                "Payment Confirmation",
                format!(
                    "Your payment for Booking #{} was successful.\nAmount Paid: {}",
                    booking_id, amount
                ),
            ),
        };

        info!(
            "Sending '{}' from {} to {}: {}",
            subject,
            self.from_email,
            command.recipient(),
            body.replace('\n', " | ")
        );
        Ok(())
    }
}

/// Consumes the notification queue. Delivery failures are logged and
/// swallowed; they must never reach the request that published the command.
pub async fn start_notification_worker(
    mut rx: mpsc::Receiver<NotificationCommand>,
    sink: std::sync::Arc<dyn NotificationSink>,
) {
    info!("Notification worker started");
    while let Some(command) = rx.recv().await {
        if let Err(e) = sink.deliver(&command).await {
            error!("Failed to deliver notification to {}: {}", command.recipient(), e);
        }
    }
    info!("Notification queue closed, worker stopping");
}
