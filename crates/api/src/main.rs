use anyhow::Context;

use warden_api::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warden_observability::init();

    let settings = Settings::from_env();
    let policy = settings.load_policy().context("failed to load authorization policy")?;
    let app = warden_api::app::build_app(&settings.jwt_secret, policy)
        .context("failed to build application")?;

    let listener = tokio::net::TcpListener::bind(&settings.listen)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
