use anyhow::Result;
use pokedex_gateway::{Gateway, GatewayConfig, LoggingMiddleware};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .compact()
        .init();

    info!(
        downstream = %config.downstream_url,
        delete_confirmation = ?config.delete_confirmation,
        "GraphQL gateway on http://{}/graphql (ws://{}/graphql/ws for subscriptions)",
        config.listen_addr,
        config.listen_addr
    );

    Gateway::builder()
        .with_config(&config)
        .add_middleware(LoggingMiddleware)
        .serve(config.listen_addr.clone())
        .await?;

    Ok(())
}
