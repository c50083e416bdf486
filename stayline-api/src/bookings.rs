use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use stayline_booking::CreateBookingRequest;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/listings/{listing_id}/bookings", post(create_booking))
        .route("/v1/listings/{listing_id}/bookings/{booking_id}", get(get_booking))
}

/// POST /v1/listings/{listing_id}/bookings
///
/// Creates the booking, opens a payment with the gateway and returns the
/// checkout URL the guest completes payment on.
async fn create_booking(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let session = state.orchestrator.create_booking(listing_id, request).await?;
    info!("Booking {} created with payment {}", session.booking.id, session.payment.transaction_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "booking": session.booking,
            "payment": session.payment,
            "checkout_url": session.checkout_url,
        })),
    ))
}

/// GET /v1/listings/{listing_id}/bookings/{booking_id}
async fn get_booking(
    State(state): State<AppState>,
    Path((listing_id, booking_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let booking = state.orchestrator.get_booking(listing_id, booking_id).await?;
    Ok(Json(json!({ "booking": booking })))
}
