use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;

use coursehub::coursehub_config::ServerConfig;
use coursehub::logging::init_tracing;
use coursehub::metrics::{init_metrics, metrics_app};
use coursehub::router::init_router;
use coursehub::state::init_app_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    init_tracing()?;
    let metrics_handle = init_metrics()?;

    let state = init_app_state().await?;
    sqlx::migrate!("./migrations")
        .run(&state.db)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations applied");

    let mut app = init_router(state);
    if let Some(handle) = metrics_handle {
        app = app.merge(metrics_app(handle));
    }

    let server_config = ServerConfig::from_env();
    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(address = %address, "Server running");
    info!("Swagger UI available at /swagger-ui, Scalar at /scalar");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
