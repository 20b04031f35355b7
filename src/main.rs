use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use dotenvy::dotenv;

mod advice;
mod config;
mod cycle;
mod error;
mod llm;
mod models;
mod routes;

use advice::Advisor;
use config::Config;
use llm::OpenAiClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    tracing::debug!("Loaded {:?}", config);

    let client = OpenAiClient::from_config(&config).context("building OpenAI client")?;
    let advisor = Advisor::new(Arc::new(client), config.prep_threshold);

    let app = Router::new()
        .merge(routes::predict::routes(advisor.clone()))
        .merge(routes::notify::routes(advisor.clone()))
        .merge(routes::dashboard::routes(advisor))
        .route("/health", get(|| async { "✅ Backend up" }));

    let addr = config.bind_addr();
    tracing::info!("🧠 Server running at {} (prep threshold {} days)", addr, config.prep_threshold);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
