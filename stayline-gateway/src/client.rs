use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

use stayline_core::payment::{
    GatewayError, InitializeOutcome, InitializePayment, PaymentGateway, VerifyOutcome,
};

/// Gateway endpoint and credentials, injected at construction time.
#[derive(Debug, Clone)]
pub struct ChapaConfig {
    pub base_url: String,
    pub secret_key: String,
    pub timeout: Duration,
}

/// HTTP client for a Chapa-shaped payment gateway. Translates domain data
/// to the wire format and validates responses against a typed schema so a
/// malformed body fails fast instead of propagating nulls. Never retries;
/// retry policy belongs to the orchestrator.
#[derive(Clone)]
pub struct ChapaClient {
    client: Client,
    config: ChapaConfig,
}

#[derive(Serialize)]
struct InitializePayload<'a> {
    amount: String,
    currency: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    tx_ref: String,
    callback_url: &'a str,
    return_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    status: String,
    #[serde(default)]
    message: Option<Value>,
    data: Option<InitializeData>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    checkout_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: String,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: Option<String>,
}

impl ChapaClient {
    pub fn new(config: ChapaConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Read the body and parse it both as raw JSON (kept for audit) and
    /// against the typed schema `T`.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<(reqwest::StatusCode, Value, T), GatewayError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let raw: Value = serde_json::from_str(&text).map_err(|e| GatewayError::MalformedResponse {
            status: status.as_u16(),
            detail: e.to_string(),
        })?;
        let typed: T =
            serde_json::from_value(raw.clone()).map_err(|e| GatewayError::MalformedResponse {
                status: status.as_u16(),
                detail: e.to_string(),
            })?;
        Ok((status, raw, typed))
    }
}

#[async_trait]
impl PaymentGateway for ChapaClient {
    async fn initialize(
        &self,
        request: &InitializePayment,
    ) -> Result<InitializeOutcome, GatewayError> {
        let payload = InitializePayload {
            amount: request.amount.to_string(),
            currency: &request.currency,
            email: &request.email,
            first_name: &request.first_name,
            last_name: &request.last_name,
            tx_ref: request.tx_ref.to_string(),
            callback_url: &request.callback_url,
            return_url: &request.return_url,
        };

        let url = format!("{}/transaction/initialize", self.base_url());
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Gateway initialize transport failure: {}", e);
                GatewayError::Transport(e.to_string())
            })?;

        let (status, raw, parsed) = Self::decode::<InitializeResponse>(response).await?;

        if status.is_success() && parsed.status == "success" {
            let checkout_url = parsed
                .data
                .and_then(|d| d.checkout_url)
                .ok_or_else(|| GatewayError::MalformedResponse {
                    status: status.as_u16(),
                    detail: "missing data.checkout_url".to_string(),
                })?;
            Ok(InitializeOutcome::Success { checkout_url, raw })
        } else {
            let message = match parsed.message {
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => format!("gateway returned status {}", parsed.status),
            };
            warn!("Gateway declined initialize (http {}): {}", status, message);
            Ok(InitializeOutcome::Declined { message, raw })
        }
    }

    async fn verify(&self, tx_ref: Uuid) -> Result<VerifyOutcome, GatewayError> {
        let url = format!("{}/transaction/verify/{}", self.base_url(), tx_ref);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| {
                error!("Gateway verify transport failure: {}", e);
                GatewayError::Transport(e.to_string())
            })?;

        let (status, raw, parsed) = Self::decode::<VerifyResponse>(response).await?;

        let settled = status.is_success()
            && parsed.status == "success"
            && parsed.data.and_then(|d| d.status).as_deref() == Some("success");

        if settled {
            Ok(VerifyOutcome::Verified { raw })
        } else {
            warn!("Gateway reported unverified transaction {} (http {})", tx_ref, status);
            Ok(VerifyOutcome::Rejected { raw })
        }
    }
}
