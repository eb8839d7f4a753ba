use std::net::SocketAddr;

use anyhow::Result as AnyResult;
use dealcast_gateway::{WEBHOOK_PATH, app_router, build_state};
use dealcast_platform::RelayConfig;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "dealcast_gateway=info,dealcast_platform=info,tower_http=info".to_string()
        }))
        .init();

    let config = RelayConfig::from_env("0.0.0.0:3000")?;
    if config.chat_webhook_url.is_none() {
        warn!("DISCORD_WEBHOOK_URL not set; notifications will fail to deliver");
    }
    if config.crm_domain.is_none() {
        warn!("PIPEDRIVE_COMPANY_DOMAIN not set; messages will carry no deal links");
    }
    if !config.enrichment_enabled() {
        info!("PIPEDRIVE_API_TOKEN not set; contact and organization lookups disabled");
    }
    if config.webhook_secret.is_some() && !config.require_signature {
        warn!("WEBHOOK_SECRET is set but unsigned webhooks are still accepted");
    }

    let router = app_router(build_state(&config)?);

    let addr: SocketAddr = config.http_addr.parse()?;
    info!("gateway listening on {}, webhook path {}", addr, WEBHOOK_PATH);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
