use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use flittpay_server::config::Config;
use flittpay_server::gateway::{FlittGateway, PaymentGateway};
use flittpay_server::ledger::{InMemoryLedger, LedgerStore, PgLedger};
use flittpay_server::{create_router, db, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    if !config.merchant.is_complete() {
        tracing::warn!(
            "FLITT_MERCHANT_ID or FLITT_SECRET_KEY not set; payment requests will fail"
        );
    }

    let ledger: Arc<dyn LedgerStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url)
                .await
                .context("failed to connect to database")?;
            db::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            tracing::info!("Using PostgreSQL ledger");
            Arc::new(PgLedger::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; balances are kept in memory only");
            Arc::new(InMemoryLedger::new())
        }
    };

    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        FlittGateway::new(&config.gateway, config.merchant.clone())
            .context("failed to build payment gateway client")?,
    );

    let state = AppState::new(&config, ledger, gateway);
    tracing::info!(flow = ?state.flow_kind(), "Payment routes configured");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Server is running on port {}", config.port);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
