use anyhow::Context;

use innkeep_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    innkeep_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = innkeep_api::app::services::build_services(&config).await?;
    let app = innkeep_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        persistent = config.is_persistent(),
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
