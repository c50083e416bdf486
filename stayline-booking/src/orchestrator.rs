use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use stayline_core::notify::NotificationCommand;
use stayline_core::payment::{
    GatewayError, InitializeOutcome, InitializePayment, PaymentGateway, VerifyOutcome,
};
use stayline_core::repository::{BookingRepository, ListingRepository, PaymentRepository, RepoError};
use stayline_core::{Booking, GuestContact, Payment, PaymentStatus};

/// Tuning knobs for the payment flow, injected from configuration.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub currency: String,
    /// Externally reachable base URL used to build gateway callback/return URLs.
    pub public_base_url: String,
    /// Total attempts per gateway call; transport failures are retried with
    /// exponential backoff, business declines are never retried.
    pub gateway_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            currency: "ETB".to_string(),
            public_base_url: "http://127.0.0.1:8080".to_string(),
            gateway_attempts: 3,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Computed by the booking-creation collaborator; must be positive.
    pub total_price: Decimal,
}

/// Result of creating a booking together with its first payment.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub booking: Booking,
    pub payment: Payment,
    pub checkout_url: String,
}

/// Result of initiating a payment for an existing booking.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub payment: Payment,
    pub checkout_url: String,
}

/// Result of a verification call: the durably committed payment state plus
/// the raw gateway payload for audit.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub payment: Payment,
    pub gateway_response: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Transport-level gateway failure. On verify the payment is left
    /// untouched; on initialize it has already been failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The gateway was reachable and declined the transaction, or the
    /// payment is already in a failed terminal state.
    #[error("{message}")]
    PaymentDeclined {
        message: String,
        payment: Payment,
        gateway_response: serde_json::Value,
    },

    #[error("storage error: {0}")]
    Storage(#[source] RepoError),
}

impl BookingError {
    fn storage(err: RepoError) -> Self {
        BookingError::Storage(err)
    }
}

/// Coordinates booking creation, payment record creation, gateway
/// initialization and verification-driven state transitions.
pub struct BookingOrchestrator {
    listings: Arc<dyn ListingRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifications: mpsc::Sender<NotificationCommand>,
    settings: PaymentSettings,
}

impl BookingOrchestrator {
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: mpsc::Sender<NotificationCommand>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            listings,
            bookings,
            payments,
            gateway,
            notifications,
            settings,
        }
    }

    /// Create a booking for a listing and immediately initiate its payment.
    ///
    /// The booking is confirmed and durable before the gateway is contacted:
    /// a failed initialization leaves a valid, payable-later booking behind.
    pub async fn create_booking(
        &self,
        listing_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<CheckoutSession, BookingError> {
        self.listings
            .get(listing_id)
            .await
            .map_err(BookingError::storage)?
            .ok_or_else(|| BookingError::NotFound(format!("listing {}", listing_id)))?;

        let guest = GuestContact {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
        };
        let booking = Booking::new(
            listing_id,
            guest,
            request.start_date,
            request.end_date,
            request.total_price,
        )
        .map_err(|e| BookingError::Validation(e.to_string()))?;

        self.bookings
            .create(&booking)
            .await
            .map_err(BookingError::storage)?;
        info!("Booking confirmed: {}", booking.id);

        self.enqueue(NotificationCommand::BookingConfirmation {
            recipient: booking.guest.email.clone(),
            booking_id: booking.id,
            total_price: booking.total_price,
        });

        let session = self.initialize_payment(&booking).await?;
        Ok(CheckoutSession {
            booking,
            payment: session.payment,
            checkout_url: session.checkout_url,
        })
    }

    /// Initiate a fresh payment for an existing booking (retry after a
    /// failed or abandoned checkout). Older pending payments are superseded
    /// so at most one record is ever actively awaiting verification.
    pub async fn create_payment(
        &self,
        listing_id: Uuid,
        booking_id: Uuid,
    ) -> Result<PaymentSession, BookingError> {
        let booking = self.get_booking(listing_id, booking_id).await?;
        self.initialize_payment(&booking).await
    }

    /// Reconcile a gateway verification callback (or client poll) with the
    /// local payment record.
    ///
    /// The payment is resolved strictly by tx_ref and must belong to the
    /// booking; the gateway answer is then committed via compare-and-set so
    /// the first transition wins and re-verification is an idempotent no-op
    /// that sends no second notification.
    pub async fn verify_payment(
        &self,
        listing_id: Uuid,
        booking_id: Uuid,
        tx_ref: &str,
    ) -> Result<VerifiedPayment, BookingError> {
        if tx_ref.trim().is_empty() {
            return Err(BookingError::Validation("tx_ref is required".to_string()));
        }
        let tx_ref: Uuid = tx_ref
            .parse()
            .map_err(|_| BookingError::Validation("tx_ref is not a valid transaction reference".to_string()))?;

        let booking = self.get_booking(listing_id, booking_id).await?;
        let payment = self
            .payments
            .get(tx_ref)
            .await
            .map_err(BookingError::storage)?
            .filter(|p| p.booking_id == booking.id)
            .ok_or_else(|| BookingError::NotFound(format!("payment {}", tx_ref)))?;

        // Transport failures surface as Bad Gateway and leave the payment untouched.
        let outcome = self
            .call_gateway("verify", || self.gateway.verify(tx_ref))
            .await?;

        match outcome {
            VerifyOutcome::Verified { raw } => {
                let transitioned = self
                    .payments
                    .transition(tx_ref, PaymentStatus::Completed)
                    .await
                    .map_err(BookingError::storage)?;
                if transitioned {
                    info!("Payment {} completed for booking {}", tx_ref, booking.id);
                    self.enqueue(NotificationCommand::PaymentConfirmation {
                        recipient: booking.guest.email.clone(),
                        booking_id: booking.id,
                        amount: payment.amount,
                    });
                }
                self.settle(tx_ref, raw).await
            }
            VerifyOutcome::Rejected { raw } => {
                let transitioned = self
                    .payments
                    .transition(tx_ref, PaymentStatus::Failed)
                    .await
                    .map_err(BookingError::storage)?;
                if transitioned {
                    warn!("Payment {} failed verification for booking {}", tx_ref, booking.id);
                }
                self.settle(tx_ref, raw).await
            }
        }
    }

    pub async fn get_booking(
        &self,
        listing_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Booking, BookingError> {
        self.bookings
            .get(booking_id)
            .await
            .map_err(BookingError::storage)?
            .filter(|b| b.listing_id == listing_id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", booking_id)))
    }

    /// Audit trail: every payment ever created for the booking, oldest first.
    pub async fn list_payments(
        &self,
        listing_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Vec<Payment>, BookingError> {
        let booking = self.get_booking(listing_id, booking_id).await?;
        self.payments
            .list_for_booking(booking.id)
            .await
            .map_err(BookingError::storage)
    }

    /// Persist a pending payment and open a checkout session with the
    /// gateway. Initialization failures of any kind fail the payment record
    /// but never roll back the booking.
    async fn initialize_payment(&self, booking: &Booking) -> Result<PaymentSession, BookingError> {
        let superseded = self
            .payments
            .supersede_pending(booking.id)
            .await
            .map_err(BookingError::storage)?;
        if superseded > 0 {
            info!("Superseded {} pending payment(s) for booking {}", superseded, booking.id);
        }

        let mut payment = Payment::new(booking);
        self.payments
            .create(&payment)
            .await
            .map_err(BookingError::storage)?;

        let request = InitializePayment {
            amount: payment.amount,
            currency: self.settings.currency.clone(),
            email: booking.guest.email.clone(),
            first_name: booking.guest.first_name.clone(),
            last_name: booking.guest.last_name.clone(),
            tx_ref: payment.transaction_id,
            callback_url: self.payments_url(booking, "verify"),
            return_url: self.payments_url(booking, "success"),
        };

        match self.call_gateway("initialize", || self.gateway.initialize(&request)).await {
            Ok(InitializeOutcome::Success { checkout_url, .. }) => {
                info!("Payment {} initialized for booking {}", payment.transaction_id, booking.id);
                Ok(PaymentSession { payment, checkout_url })
            }
            Ok(InitializeOutcome::Declined { message, raw }) => {
                warn!(
                    "Gateway declined to initialize payment {} for booking {}: {}",
                    payment.transaction_id, booking.id, message
                );
                self.payments
                    .transition(payment.transaction_id, PaymentStatus::Failed)
                    .await
                    .map_err(BookingError::storage)?;
                payment.status = PaymentStatus::Failed;
                Err(BookingError::PaymentDeclined {
                    message: "Failed to initialize payment".to_string(),
                    payment,
                    gateway_response: raw,
                })
            }
            Err(err) => {
                error!(
                    "Gateway unreachable while initializing payment {} for booking {}: {}",
                    payment.transaction_id, booking.id, err
                );
                self.payments
                    .transition(payment.transaction_id, PaymentStatus::Failed)
                    .await
                    .map_err(BookingError::storage)?;
                Err(BookingError::Gateway(err))
            }
        }
    }

    /// Read back the durably committed state and translate it into the
    /// caller-facing result. Whatever transition won the race is truth here,
    /// regardless of what this particular gateway answer said.
    async fn settle(
        &self,
        tx_ref: Uuid,
        gateway_response: serde_json::Value,
    ) -> Result<VerifiedPayment, BookingError> {
        let payment = self
            .payments
            .get(tx_ref)
            .await
            .map_err(BookingError::storage)?
            .ok_or_else(|| BookingError::NotFound(format!("payment {}", tx_ref)))?;

        match payment.status {
            PaymentStatus::Completed => Ok(VerifiedPayment { payment, gateway_response }),
            _ => Err(BookingError::PaymentDeclined {
                message: "Payment verification failed".to_string(),
                payment,
                gateway_response,
            }),
        }
    }

    /// Retry transport-level gateway failures with exponential backoff.
    /// Business declines come back as `Ok` and are never retried.
    async fn call_gateway<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let attempts = self.settings.gateway_attempts.max(1);
        let mut attempt: u32 = 1;
        loop {
            match call().await {
                Err(GatewayError::Transport(reason)) if attempt < attempts => {
                    let delay = self.settings.retry_backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        "Gateway {} attempt {}/{} failed ({}), retrying in {:?}",
                        what, attempt, attempts, reason, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn payments_url(&self, booking: &Booking, suffix: &str) -> String {
        format!(
            "{}/v1/listings/{}/bookings/{}/payments/{}",
            self.settings.public_base_url.trim_end_matches('/'),
            booking.listing_id,
            booking.id,
            suffix
        )
    }

    /// Fire-and-forget: a full or closed queue drops the notification with a
    /// warning and never affects the calling request.
    fn enqueue(&self, command: NotificationCommand) {
        if let Err(err) = self.notifications.try_send(command) {
            warn!("Dropping notification, queue unavailable: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use stayline_core::Listing;
    use stayline_store::memory::{InMemoryBookings, InMemoryListings, InMemoryPayments};

    struct StubGateway {
        init_results: Mutex<VecDeque<Result<InitializeOutcome, GatewayError>>>,
        verify_results: Mutex<VecDeque<Result<VerifyOutcome, GatewayError>>>,
        verify_calls: AtomicU32,
    }

    impl StubGateway {
        fn new() -> Self {
            Self {
                init_results: Mutex::new(VecDeque::new()),
                verify_results: Mutex::new(VecDeque::new()),
                verify_calls: AtomicU32::new(0),
            }
        }

        fn push_init(&self, result: Result<InitializeOutcome, GatewayError>) {
            self.init_results.lock().unwrap().push_back(result);
        }

        fn push_verify(&self, result: Result<VerifyOutcome, GatewayError>) {
            self.verify_results.lock().unwrap().push_back(result);
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn initialize(
            &self,
            _request: &InitializePayment,
        ) -> Result<InitializeOutcome, GatewayError> {
            self.init_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(InitializeOutcome::Success {
                    checkout_url: "https://pay/xyz".to_string(),
                    raw: json!({"status": "success"}),
                }))
        }

        async fn verify(&self, _tx_ref: Uuid) -> Result<VerifyOutcome, GatewayError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            self.verify_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(VerifyOutcome::Verified {
                    raw: json!({"status": "success", "data": {"status": "success"}}),
                }))
        }
    }

    struct Harness {
        orchestrator: BookingOrchestrator,
        gateway: Arc<StubGateway>,
        payments: Arc<InMemoryPayments>,
        notifications: mpsc::Receiver<NotificationCommand>,
        listing_id: Uuid,
    }

    async fn harness() -> Harness {
        let listings = Arc::new(InMemoryListings::default());
        let bookings = Arc::new(InMemoryBookings::default());
        let payments = Arc::new(InMemoryPayments::default());
        let gateway = Arc::new(StubGateway::new());
        let (tx, rx) = mpsc::channel(16);

        let listing = Listing::new(
            "host@example.com".to_string(),
            "Lakeside Cabin".to_string(),
            "Bahir Dar".to_string(),
            dec!(50.00),
        );
        let listing_id = listing.id;
        listings.create(&listing).await.unwrap();

        let settings = PaymentSettings {
            retry_backoff: Duration::ZERO,
            ..PaymentSettings::default()
        };
        let orchestrator = BookingOrchestrator::new(
            listings,
            bookings,
            payments.clone(),
            gateway.clone(),
            tx,
            settings,
        );

        Harness {
            orchestrator,
            gateway,
            payments,
            notifications: rx,
            listing_id,
        }
    }

    fn request(price: Decimal) -> CreateBookingRequest {
        let start = Utc::now();
        CreateBookingRequest {
            email: "a@b.com".to_string(),
            first_name: "Abel".to_string(),
            last_name: "Bekele".to_string(),
            start_date: start,
            end_date: start + ChronoDuration::days(2),
            total_price: price,
        }
    }

    fn drain(rx: &mut mpsc::Receiver<NotificationCommand>) -> Vec<NotificationCommand> {
        let mut out = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            out.push(cmd);
        }
        out
    }

    #[tokio::test]
    async fn creates_booking_with_pending_payment_and_checkout() {
        let mut h = harness().await;

        let session = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap();

        assert_eq!(session.payment.status, PaymentStatus::Pending);
        assert_eq!(session.payment.amount, dec!(100.00));
        assert_eq!(session.payment.booking_id, session.booking.id);
        assert_eq!(session.checkout_url, "https://pay/xyz");

        let all = h.payments.list_for_booking(session.booking.id).await.unwrap();
        assert_eq!(all.len(), 1);

        let sent = drain(&mut h.notifications);
        assert!(matches!(
            sent.as_slice(),
            [NotificationCommand::BookingConfirmation { .. }]
        ));
    }

    #[tokio::test]
    async fn unknown_listing_is_not_found() {
        let h = harness().await;
        let err = h
            .orchestrator
            .create_booking(Uuid::new_v4(), request(dec!(100.00)))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn equal_start_and_end_is_rejected() {
        let h = harness().await;
        let mut req = request(dec!(100.00));
        req.end_date = req.start_date;
        let err = h
            .orchestrator
            .create_booking(h.listing_id, req)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let h = harness().await;
        let err = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn declined_initialization_fails_payment_but_keeps_booking() {
        let h = harness().await;
        h.gateway.push_init(Ok(InitializeOutcome::Declined {
            message: "insufficient merchant balance".to_string(),
            raw: json!({"status": "failed"}),
        }));

        let err = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap_err();

        let payment = match err {
            BookingError::PaymentDeclined { payment, .. } => payment,
            other => panic!("expected PaymentDeclined, got {:?}", other),
        };
        assert_eq!(payment.status, PaymentStatus::Failed);

        // The booking survives the failed initialization.
        let booking = h
            .orchestrator
            .get_booking(h.listing_id, payment.booking_id)
            .await
            .unwrap();
        assert_eq!(booking.id, payment.booking_id);

        let stored = h.payments.get(payment.transaction_id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn transport_failure_on_initialize_fails_payment() {
        let h = harness().await;
        for _ in 0..3 {
            h.gateway
                .push_init(Err(GatewayError::Transport("connection refused".to_string())));
        }

        let err = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Gateway(_)));

        let booking_id = {
            let all = h.payments.all().await;
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].status, PaymentStatus::Failed);
            all[0].booking_id
        };
        // Booking is still independently retrievable.
        h.orchestrator.get_booking(h.listing_id, booking_id).await.unwrap();
    }

    #[tokio::test]
    async fn verify_completes_payment_and_notifies_once() {
        let mut h = harness().await;
        let session = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap();
        drain(&mut h.notifications);

        let tx_ref = session.payment.transaction_id.to_string();
        let verified = h
            .orchestrator
            .verify_payment(h.listing_id, session.booking.id, &tx_ref)
            .await
            .unwrap();
        assert_eq!(verified.payment.status, PaymentStatus::Completed);

        // Idempotent re-verification: same result, no second notification.
        let again = h
            .orchestrator
            .verify_payment(h.listing_id, session.booking.id, &tx_ref)
            .await
            .unwrap();
        assert_eq!(again.payment.status, PaymentStatus::Completed);

        let sent = drain(&mut h.notifications);
        assert!(matches!(
            sent.as_slice(),
            [NotificationCommand::PaymentConfirmation { .. }]
        ));
    }

    #[tokio::test]
    async fn verify_rejection_fails_payment_without_notification() {
        let mut h = harness().await;
        let session = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap();
        drain(&mut h.notifications);

        h.gateway.push_verify(Ok(VerifyOutcome::Rejected {
            raw: json!({"status": "failed", "data": {"status": "failed"}}),
        }));

        let err = h
            .orchestrator
            .verify_payment(
                h.listing_id,
                session.booking.id,
                &session.payment.transaction_id.to_string(),
            )
            .await
            .unwrap_err();

        match err {
            BookingError::PaymentDeclined { payment, gateway_response, .. } => {
                assert_eq!(payment.status, PaymentStatus::Failed);
                assert_eq!(gateway_response["status"], "failed");
            }
            other => panic!("expected PaymentDeclined, got {:?}", other),
        }
        assert!(drain(&mut h.notifications).is_empty());
    }

    #[tokio::test]
    async fn transport_failure_on_verify_leaves_payment_pending() {
        let h = harness().await;
        let session = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap();

        for _ in 0..3 {
            h.gateway
                .push_verify(Err(GatewayError::Transport("timed out".to_string())));
        }

        let err = h
            .orchestrator
            .verify_payment(
                h.listing_id,
                session.booking.id,
                &session.payment.transaction_id.to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Gateway(_)));
        // All attempts were spent.
        assert_eq!(h.gateway.verify_calls.load(Ordering::SeqCst), 3);

        let stored = h
            .payments
            .get(session.payment.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn missing_tx_ref_is_a_validation_error() {
        let h = harness().await;
        let session = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap();

        let err = h
            .orchestrator
            .verify_payment(h.listing_id, session.booking.id, "")
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        // Nothing was mutated and the gateway was never contacted.
        let stored = h
            .payments
            .get(session.payment.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
        assert_eq!(h.gateway.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_tx_ref_is_not_found() {
        let h = harness().await;
        let session = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap();

        let err = h
            .orchestrator
            .verify_payment(
                h.listing_id,
                session.booking.id,
                &Uuid::new_v4().to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn new_payment_supersedes_older_pending_one() {
        let h = harness().await;
        let session = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap();

        let retry = h
            .orchestrator
            .create_payment(h.listing_id, session.booking.id)
            .await
            .unwrap();
        assert_ne!(retry.payment.transaction_id, session.payment.transaction_id);
        assert_eq!(retry.payment.amount, session.booking.total_price);

        let first = h
            .payments
            .get(session.payment.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.status, PaymentStatus::Failed);
        let second = h.payments.get(retry.payment.transaction_id).await.unwrap().unwrap();
        assert_eq!(second.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn stale_tx_ref_verifies_the_stale_payment_not_the_latest() {
        let mut h = harness().await;
        let session = h
            .orchestrator
            .create_booking(h.listing_id, request(dec!(100.00)))
            .await
            .unwrap();
        let retry = h
            .orchestrator
            .create_payment(h.listing_id, session.booking.id)
            .await
            .unwrap();
        drain(&mut h.notifications);

        // Verifying the superseded payment observes its terminal Failed
        // state; the latest payment is not touched.
        let err = h
            .orchestrator
            .verify_payment(
                h.listing_id,
                session.booking.id,
                &session.payment.transaction_id.to_string(),
            )
            .await
            .unwrap_err();
        match err {
            BookingError::PaymentDeclined { payment, .. } => {
                assert_eq!(payment.transaction_id, session.payment.transaction_id);
                assert_eq!(payment.status, PaymentStatus::Failed);
            }
            other => panic!("expected PaymentDeclined, got {:?}", other),
        }

        let latest = h.payments.get(retry.payment.transaction_id).await.unwrap().unwrap();
        assert_eq!(latest.status, PaymentStatus::Pending);
        assert!(drain(&mut h.notifications).is_empty());
    }
}
