use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatepass_core::catalog::CatalogClient;
use gatepass_core::config::Config;
use gatepass_core::ledger::{Ledger, PgLedger};
use gatepass_core::services::lifecycle::OrderLifecycleService;
use gatepass_core::services::notifier::{NotificationDispatcher, SmtpMailer};
use gatepass_core::services::ticket::TicketRenderer;
use gatepass_core::{AppState, create_app, startup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database pool
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let ledger: Arc<dyn Ledger> = Arc::new(PgLedger::new(pool));
    let catalog = CatalogClient::new(config.catalog_base_url.clone());
    tracing::info!("Event catalog client initialized with URL: {}", config.catalog_base_url);

    let renderer = TicketRenderer::new(&config.artifact_dir);
    let dispatcher = NotificationDispatcher::new(
        Arc::new(SmtpMailer::new(&config.smtp)),
        Duration::from_secs(config.dispatch_timeout_secs),
    );
    let lifecycle = OrderLifecycleService::new(
        Arc::clone(&ledger),
        renderer,
        dispatcher,
        config.payment.clone(),
    );

    // Pre-flight checks; a dead database is fatal, the rest is reported
    let report = startup::validate_environment(&config, ledger.as_ref(), &catalog).await?;
    report.print();
    if !report.database {
        anyhow::bail!("database connectivity check failed");
    }

    let app_state = AppState {
        lifecycle: Arc::new(lifecycle),
        catalog,
    };
    let app = create_app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
