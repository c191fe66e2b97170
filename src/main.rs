use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use tours_api_rust::config::config;
use tours_api_rust::mail::SmtpMailer;
use tours_api_rust::routes;
use tours_api_rust::state::AppState;
use tours_api_rust::store::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tours_api_rust=debug,tower_http=debug".into()),
        )
        .init();

    let config = config();
    tracing::info!("Starting in {:?} mode", config.environment);

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connection_timeout))
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let store = PostgresStore::new(pool);
    store.ensure_collection("users", &[&["email"]]).await?;
    store.ensure_collection("tours", &[&["name"]]).await?;
    store
        .ensure_collection("reviews", &[&["tour", "user"]])
        .await?;

    let mailer = SmtpMailer::from_config(&config.mail)?;
    let state = AppState::new(Arc::new(store), Arc::new(mailer));

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    tracing::info!("Listening on port {}", port);

    axum::serve(listener, routes::app(state))
        .await
        .context("Server error")?;
    Ok(())
}
