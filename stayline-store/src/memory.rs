//! In-memory repositories. Back the test suites and local runs without a
//! Postgres instance; semantics (notably the compare-and-set transition)
//! match the Postgres implementations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use stayline_core::repository::{
    BookingRepository, ListingRepository, PaymentRepository, RepoError,
};
use stayline_core::{Booking, Listing, Payment, PaymentStatus};

#[derive(Default)]
pub struct InMemoryListings {
    inner: Mutex<HashMap<Uuid, Listing>>,
}

#[async_trait]
impl ListingRepository for InMemoryListings {
    async fn create(&self, listing: &Listing) -> Result<(), RepoError> {
        self.inner.lock().unwrap().insert(listing.id, listing.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Listing>, RepoError> {
        Ok(self.inner.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryBookings {
    inner: Mutex<HashMap<Uuid, Booking>>,
}

#[async_trait]
impl BookingRepository for InMemoryBookings {
    async fn create(&self, booking: &Booking) -> Result<(), RepoError> {
        self.inner.lock().unwrap().insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        Ok(self.inner.lock().unwrap().get(&id).cloned())
    }
}

/// Payments keyed by tx_ref, kept in insertion order for the audit listing.
#[derive(Default)]
pub struct InMemoryPayments {
    inner: Mutex<Vec<Payment>>,
}

impl InMemoryPayments {
    pub async fn all(&self) -> Vec<Payment> {
        self.inner.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPayments {
    async fn create(&self, payment: &Payment) -> Result<(), RepoError> {
        self.inner.lock().unwrap().push(payment.clone());
        Ok(())
    }

    async fn get(&self, tx_ref: Uuid) -> Result<Option<Payment>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.transaction_id == tx_ref)
            .cloned())
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn transition(&self, tx_ref: Uuid, to: PaymentStatus) -> Result<bool, RepoError> {
        // Single lock makes the check-and-update atomic, mirroring the SQL
        // `UPDATE ... WHERE status = 'Pending'`.
        let mut payments = self.inner.lock().unwrap();
        match payments
            .iter_mut()
            .find(|p| p.transaction_id == tx_ref && p.status == PaymentStatus::Pending)
        {
            Some(payment) => {
                payment.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn supersede_pending(&self, booking_id: Uuid) -> Result<u64, RepoError> {
        let mut payments = self.inner.lock().unwrap();
        let mut count = 0;
        for payment in payments
            .iter_mut()
            .filter(|p| p.booking_id == booking_id && p.status == PaymentStatus::Pending)
        {
            payment.status = PaymentStatus::Failed;
            count += 1;
        }
        Ok(count)
    }
}
