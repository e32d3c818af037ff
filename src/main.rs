mod client;
mod config;
mod offline_tools;
mod types;

use client::cli::{Agent, stdin_lines};
use client::gemini::GeminiModel;
use config::{API_KEY_ENV, Config};
use offline_tools::offline_toolset;
pub use types::Tool;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(api_key) = config.api_key() else {
        println!("{API_KEY_ENV} environment variable is not set");
        return Ok(());
    };

    if let Err(err) = chat(&config, api_key).await {
        println!("Error: {err:#}");
    }
    Ok(())
}

async fn chat(config: &Config, api_key: &str) -> Result<()> {
    let toolset = offline_toolset().context("registering tools")?;
    tracing::debug!(tools = ?toolset.names().collect::<Vec<_>>(), model = %config.model, "starting chat");

    let model = GeminiModel::new(
        api_key,
        &config.api_base,
        &config.model,
        toolset.openai_chatcompletion_toolset(),
    );
    let mut agent = Agent::new(model, toolset, stdin_lines(), tokio::io::stdout());
    agent.run().await
}
