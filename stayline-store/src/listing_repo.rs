use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stayline_core::repository::{ListingRepository, RepoError};
use stayline_core::Listing;

pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    host_email: String,
    name: String,
    location: String,
    price_per_night: rust_decimal::Decimal,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            id: row.id,
            host_email: row.host_email,
            name: row.name,
            location: row.location,
            price_per_night: row.price_per_night,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn create(&self, listing: &Listing) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO listings (id, host_email, name, location, price_per_night, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(listing.id)
        .bind(&listing.host_email)
        .bind(&listing.name)
        .bind(&listing.location)
        .bind(listing.price_per_night)
        .bind(listing.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Listing>, RepoError> {
        let row = sqlx::query_as::<_, ListingRow>(
            "SELECT id, host_email, name, location, price_per_night, created_at FROM listings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Listing::from))
    }
}
