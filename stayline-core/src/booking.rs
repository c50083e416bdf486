use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking status in the lifecycle. Bookings are confirmed at creation;
/// payment settlement is tracked separately on the Payment record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// Contact details of the requesting guest. User accounts are managed by an
/// external collaborator, so the booking carries the contact inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestContact {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookingRuleError {
    #[error("start_date must be strictly before end_date")]
    DatesOutOfOrder,

    #[error("total_price must be positive")]
    NonPositivePrice,
}

/// A guest's reservation of a listing. Immutable once created except for
/// status transitions; payments reference it and are kept as an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub guest: GuestContact,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Create a confirmed booking. The total price is computed by the
    /// caller and must be positive; the stay must span a non-empty range.
    pub fn new(
        listing_id: Uuid,
        guest: GuestContact,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        total_price: Decimal,
    ) -> Result<Self, BookingRuleError> {
        if start_date >= end_date {
            return Err(BookingRuleError::DatesOutOfOrder);
        }
        if total_price <= Decimal::ZERO {
            return Err(BookingRuleError::NonPositivePrice);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            listing_id,
            guest,
            start_date,
            end_date,
            total_price,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        })
    }
}
