use async_trait::async_trait;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use stayline_core::repository::{PaymentRepository, RepoError};
use stayline_core::{Payment, PaymentStatus};

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    transaction_id: Uuid,
    booking_id: Uuid,
    amount: rust_decimal::Decimal,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepoError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            transaction_id: row.transaction_id,
            booking_id: row.booking_id,
            amount: row.amount,
            status: PaymentStatus::from_str(&row.status)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO payments (transaction_id, booking_id, amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(payment.transaction_id)
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(payment.status.to_string())
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, tx_ref: Uuid) -> Result<Option<Payment>, RepoError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT transaction_id, booking_id, amount, status, created_at FROM payments WHERE transaction_id = $1",
        )
        .bind(tx_ref)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Payment::try_from).transpose()
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>, RepoError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT transaction_id, booking_id, amount, status, created_at
            FROM payments WHERE booking_id = $1 ORDER BY created_at ASC
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn transition(&self, tx_ref: Uuid, to: PaymentStatus) -> Result<bool, RepoError> {
        // Row-level compare-and-set: only a Pending payment can move, so
        // whichever concurrent verify commits first wins and later attempts
        // see zero affected rows.
        let result = sqlx::query(
            "UPDATE payments SET status = $1 WHERE transaction_id = $2 AND status = 'Pending'",
        )
        .bind(to.to_string())
        .bind(tx_ref)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn supersede_pending(&self, booking_id: Uuid) -> Result<u64, RepoError> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'Failed' WHERE booking_id = $1 AND status = 'Pending'",
        )
        .bind(booking_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
