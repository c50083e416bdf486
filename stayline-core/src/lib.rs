pub mod booking;
pub mod listing;
pub mod notify;
pub mod payment;
pub mod repository;

pub use booking::{Booking, BookingRuleError, BookingStatus, GuestContact};
pub use listing::Listing;
pub use payment::{Payment, PaymentStatus};
