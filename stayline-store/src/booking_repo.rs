use async_trait::async_trait;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use stayline_core::repository::{BookingRepository, RepoError};
use stayline_core::{Booking, BookingStatus, GuestContact};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    listing_id: Uuid,
    guest_email: String,
    guest_first_name: String,
    guest_last_name: String,
    start_date: chrono::DateTime<chrono::Utc>,
    end_date: chrono::DateTime<chrono::Utc>,
    total_price: rust_decimal::Decimal,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepoError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            listing_id: row.listing_id,
            guest: GuestContact {
                email: row.guest_email,
                first_name: row.guest_first_name,
                last_name: row.guest_last_name,
            },
            start_date: row.start_date,
            end_date: row.end_date,
            total_price: row.total_price,
            status: BookingStatus::from_str(&row.status)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, listing_id, guest_email, guest_first_name, guest_last_name,
                 start_date, end_date, total_price, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(booking.id)
        .bind(booking.listing_id)
        .bind(&booking.guest.email)
        .bind(&booking.guest.first_name)
        .bind(&booking.guest.last_name)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.total_price)
        .bind(booking.status.to_string())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, listing_id, guest_email, guest_first_name, guest_last_name,
                   start_date, end_date, total_price, status, created_at
            FROM bookings WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Booking::try_from).transpose()
    }
}
