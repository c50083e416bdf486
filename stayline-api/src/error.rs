use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use stayline_booking::BookingError;
use stayline_core::Payment;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    GatewayError(String),
    PaymentDeclined {
        message: String,
        payment: Payment,
        gateway_response: serde_json::Value,
    },
    InternalServerError(String),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::NotFound(msg) => AppError::NotFoundError(msg),
            BookingError::Gateway(e) => AppError::GatewayError(e.to_string()),
            BookingError::PaymentDeclined {
                message,
                payment,
                gateway_response,
            } => AppError::PaymentDeclined {
                message,
                payment,
                gateway_response,
            },
            BookingError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::NotFoundError(msg) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{} not found", msg) })),
            )
                .into_response(),
            AppError::GatewayError(msg) => {
                tracing::error!("Gateway failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": format!("Error contacting payment gateway: {}", msg) })),
                )
                    .into_response()
            }
            // Business decline: echo the gateway payload for diagnostics.
            AppError::PaymentDeclined {
                message,
                payment,
                gateway_response,
            } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": message,
                    "payment": payment,
                    "chapa_response": gateway_response,
                })),
            )
                .into_response(),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}
