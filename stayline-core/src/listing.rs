use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A property a host offers for booking. CRUD and filtering live elsewhere;
/// the payment engine only needs existence and the nightly rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub host_email: String,
    pub name: String,
    pub location: String,
    pub price_per_night: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(host_email: String, name: String, location: String, price_per_night: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            host_email,
            name,
            location,
            price_per_night,
            created_at: Utc::now(),
        }
    }
}
