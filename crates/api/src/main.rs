use anyhow::Context;

use vulndemo_api::{banner, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    vulndemo_observability::init();

    let config = AppConfig::from_env()?;
    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure default");
    }

    let app = vulndemo_api::app::build_app(&config.jwt_secret);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    banner::log_startup(listener.local_addr()?.port());

    axum::serve(listener, app).await?;
    Ok(())
}
