use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub payments: PaymentConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Credentials and endpoint of the external payment gateway. Read once at
/// startup and injected into the wire client at construction time.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub secret_key: String,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_seconds: u64,
}

fn default_gateway_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub currency: String,
    /// Externally reachable base URL, used for gateway callback/return URLs.
    pub public_base_url: String,
    #[serde(default = "default_attempts")]
    pub gateway_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub queue_capacity: usize,
    pub from_email: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Environment variables win, e.g. STAYLINE__GATEWAY__SECRET_KEY
            .add_source(config::Environment::with_prefix("STAYLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
