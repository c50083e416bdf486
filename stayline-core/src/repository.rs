use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::Booking;
use crate::listing::Listing;
use crate::payment::{Payment, PaymentStatus};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for listing lookups
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create(&self, listing: &Listing) -> Result<(), RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<Listing>, RepoError>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<(), RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, RepoError>;
}

/// Repository trait for payment data access
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<(), RepoError>;

    async fn get(&self, tx_ref: Uuid) -> Result<Option<Payment>, RepoError>;

    /// All payments for a booking, oldest first (audit trail).
    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>, RepoError>;

    /// Compare-and-set: move the payment out of Pending into `to`. Returns
    /// whether this call performed the transition. A payment already in a
    /// terminal state is left untouched and `false` is returned, so the
    /// first durably committed transition wins under concurrent verifies.
    async fn transition(&self, tx_ref: Uuid, to: PaymentStatus) -> Result<bool, RepoError>;

    /// Fail every Pending payment of a booking. Used when a fresh payment
    /// supersedes older attempts; returns how many records were failed.
    async fn supersede_pending(&self, booking_id: Uuid) -> Result<u64, RepoError>;
}
