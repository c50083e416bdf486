use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::booking::Booking;

/// Payment status. Pending is the only non-terminal state; Completed and
/// Failed are terminal and no transition is defined out of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Completed" => Ok(PaymentStatus::Completed),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// A settlement attempt for a booking. The transaction id doubles as the
/// gateway correlation token (tx_ref), so it must be unguessable. Payments
/// are never deleted: failed and superseded records stay as an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub transaction_id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// New pending payment for a booking. The amount is taken from the
    /// booking's total price so the two can never drift apart.
    pub fn new(booking: &Booking) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            booking_id: booking.id,
            amount: booking.total_price,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Everything the gateway needs to open a checkout session.
#[derive(Debug, Clone)]
pub struct InitializePayment {
    pub amount: Decimal,
    pub currency: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tx_ref: Uuid,
    pub callback_url: String,
    pub return_url: String,
}

/// Well-formed gateway answer to an initialize call. A decline is a business
/// outcome, not an error: the gateway was reachable and said no.
#[derive(Debug, Clone)]
pub enum InitializeOutcome {
    Success {
        checkout_url: String,
        raw: serde_json::Value,
    },
    Declined {
        message: String,
        raw: serde_json::Value,
    },
}

/// Well-formed gateway answer to a verify call. The raw payload is carried
/// through for audit and diagnostics.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Verified { raw: serde_json::Value },
    Rejected { raw: serde_json::Value },
}

/// Transport-level failure talking to the gateway: connect/timeout errors or
/// a response body that does not match the wire schema. Distinct from a
/// well-formed decline, and logged differently by callers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(String),

    #[error("malformed gateway response (http {status}): {detail}")]
    MalformedResponse { status: u16, detail: String },
}

/// Outbound contract with the external payment processor. Implementations
/// must not retry internally; retry policy belongs to the orchestrator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a transaction with the provider and obtain a checkout handle.
    async fn initialize(&self, request: &InitializePayment) -> Result<InitializeOutcome, GatewayError>;

    /// Ask the provider for the final status of a transaction.
    async fn verify(&self, tx_ref: Uuid) -> Result<VerifyOutcome, GatewayError>;
}
