use std::sync::Arc;

use anyhow::Context;
use orders_hex::config::Config;
use orders_hex::inbound::http::{HttpServer, HttpServerConfig};
use orders_payments::stripe::{StripeConfig, StripeGateway};
use orders_repo::{build_repo, Repo};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / STRIPE_* when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Arc<Repo> = Arc::new(build_repo(config.database_url.as_deref()).await?);
    tracing::info!(store = repo.kind(), environment = %config.environment, "store ready");

    if config.stripe_webhook_secret.is_empty() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is empty; every webhook will be rejected");
    }
    let stripe = StripeGateway::new(StripeConfig {
        api_base: config.stripe_api_base.clone(),
        tolerance_secs: config.webhook_tolerance_secs,
        ..StripeConfig::new(&config.stripe_api_key, &config.stripe_webhook_secret)
    })
    .context("building payment gateway")?;

    let server_cfg = HttpServerConfig {
        allowed_origins: config.allowed_origins.clone(),
        request_timeout: config.request_timeout(),
        environment: config.environment.clone(),
        database_kind: repo.kind().to_string(),
        processor_configured: stripe.is_configured(),
        ..HttpServerConfig::new(&config.server_port, &config.admin_api_key)
    };

    let http = HttpServer::new(repo.clone(), Arc::new(stripe), server_cfg).await?;
    let served = http.run_until(shutdown_signal()).await;
    repo.close().await;
    tracing::info!("store closed");
    served
}
