pub mod orchestrator;

pub use orchestrator::{
    BookingError, BookingOrchestrator, CheckoutSession, CreateBookingRequest, PaymentSession,
    PaymentSettings, VerifiedPayment,
};
