use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/listings/{listing_id}/bookings/{booking_id}/payments",
            post(create_payment).get(list_payments),
        )
        .route(
            "/v1/listings/{listing_id}/bookings/{booking_id}/payments/verify",
            get(verify_payment),
        )
}

/// POST /v1/listings/{listing_id}/bookings/{booking_id}/payments
///
/// Opens a fresh payment for an existing booking (e.g. after an abandoned
/// checkout). Any older pending payment is superseded.
async fn create_payment(
    State(state): State<AppState>,
    Path((listing_id, booking_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let session = state.orchestrator.create_payment(listing_id, booking_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "payment": session.payment,
            "checkout_url": session.checkout_url,
        })),
    ))
}

/// GET /v1/listings/{listing_id}/bookings/{booking_id}/payments
///
/// Audit trail: every payment attempt ever made for the booking.
async fn list_payments(
    State(state): State<AppState>,
    Path((listing_id, booking_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let payments = state.orchestrator.list_payments(listing_id, booking_id).await?;
    Ok(Json(json!({ "payments": payments })))
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
    tx_ref: Option<String>,
}

/// GET /v1/listings/{listing_id}/bookings/{booking_id}/payments/verify?tx_ref=...
///
/// Driven by the gateway callback or a client poll; reconciles the gateway's
/// answer with the local payment record.
async fn verify_payment(
    State(state): State<AppState>,
    Path((listing_id, booking_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<Value>, AppError> {
    let tx_ref = params.tx_ref.unwrap_or_default();
    let verified = state
        .orchestrator
        .verify_payment(listing_id, booking_id, &tx_ref)
        .await?;

    Ok(Json(json!({
        "message": "Payment verified successfully",
        "payment": verified.payment,
        "chapa_response": verified.gateway_response,
    })))
}
