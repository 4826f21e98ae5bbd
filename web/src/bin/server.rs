//! Kiosk HTTP server.
//!
//! Reads configuration from the environment (and `.env`), picks the
//! `PostgreSQL` store when `DATABASE_URL` is set or the in-memory store
//! otherwise, and serves the API until Ctrl+C.

use anyhow::Context;
use kiosk_core::environment::SystemClock;
use kiosk_core::providers::KioskStore;
use kiosk_postgres::PostgresStore;
use kiosk_runtime::metrics::MetricsExporter;
use kiosk_runtime::{InMemoryStore, Kiosk, SharedSecretGateway};
use kiosk_web::seed::seed_demo_catalog;
use kiosk_web::{AppState, Config, build_router};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut exporter = MetricsExporter::new();
    exporter.install()?;

    if config.admin.uses_default_password() {
        warn!("ADMIN_PASSWORD is unset; the default admin password is in use");
    }
    if config.payment.shared_secret.is_empty() {
        warn!("PAYMENT_SHARED_SECRET is unset; payment verification will fail");
    }

    match config.database.url.clone() {
        Some(url) => {
            let store = PostgresStore::connect(
                &url,
                config.database.max_connections,
                config.database.min_connections,
                Duration::from_secs(config.database.connect_timeout),
            )
            .await
            .context("connecting to PostgreSQL")?;
            store.migrate().await.context("running migrations")?;
            info!("Using PostgreSQL store");
            serve(store, config, exporter).await
        }
        None => {
            info!("DATABASE_URL is unset; using the in-memory store");
            serve(InMemoryStore::new(), config, exporter).await
        }
    }
}

async fn serve<S: KioskStore>(store: S, config: Config, exporter: MetricsExporter) -> anyhow::Result<()> {
    let kiosk = Kiosk::new(
        store,
        Arc::new(SharedSecretGateway::new(&config.payment.shared_secret)),
        Arc::new(SystemClock),
        config.admin.settings(),
    );

    if config.seed.demo_catalog {
        let seeded = seed_demo_catalog(&kiosk).await?;
        info!(products = seeded, "Demo catalog check done");
    }

    let state = AppState::with_metrics(kiosk, exporter);
    tokio::spawn(purge_sessions(Arc::clone(&state.kiosk)));
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Kiosk server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn purge_sessions<S: KioskStore>(kiosk: Arc<Kiosk<S>>) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match kiosk.admin.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "Expired admin sessions purged"),
            Err(err) => warn!(error = %err, "Session purge failed"),
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!(error = %err, "Unable to listen for shutdown signal"),
    }
}
