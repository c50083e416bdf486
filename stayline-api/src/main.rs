use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use stayline_api::{app, worker, AppState};
use stayline_booking::{BookingOrchestrator, PaymentSettings};
use stayline_gateway::{ChapaClient, ChapaConfig};
use stayline_store::{DbClient, PgBookingRepository, PgListingRepository, PgPaymentRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stayline_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = stayline_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Stayline API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let gateway = Arc::new(ChapaClient::new(ChapaConfig {
        base_url: config.gateway.base_url.clone(),
        secret_key: config.gateway.secret_key.clone(),
        timeout: Duration::from_secs(config.gateway.timeout_seconds),
    }));

    let (notify_tx, notify_rx) = tokio::sync::mpsc::channel(config.notifications.queue_capacity);
    let sink = Arc::new(worker::EmailNotifier::new(config.notifications.from_email.clone()));
    tokio::spawn(worker::start_notification_worker(notify_rx, sink));

    let orchestrator = Arc::new(BookingOrchestrator::new(
        Arc::new(PgListingRepository::new(db.pool.clone())),
        Arc::new(PgBookingRepository::new(db.pool.clone())),
        Arc::new(PgPaymentRepository::new(db.pool.clone())),
        gateway,
        notify_tx,
        PaymentSettings {
            currency: config.payments.currency.clone(),
            public_base_url: config.payments.public_base_url.clone(),
            gateway_attempts: config.payments.gateway_attempts,
            retry_backoff: Duration::from_millis(config.payments.retry_backoff_ms),
        },
    ));

    let app = app(AppState { orchestrator });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
