pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod listing_repo;
pub mod memory;
pub mod payment_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use listing_repo::PgListingRepository;
pub use payment_repo::PgPaymentRepository;
