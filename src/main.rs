use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use autodev::commands;
use autodev::config::Config;
use autodev::llm::{LLMProvider, OpenAiProvider};

/// autodev - a conversational coding agent
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "autodev.yaml")]
    config: String,

    /// Model name (overrides config file)
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autodev=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config).await?;
    if let Some(model) = args.model {
        config.llm.model = model;
    }

    let api_key = match config.llm.api_key.clone() {
        Some(key) => key,
        None => std::env::var("OPENAI_API_KEY")
            .context("no API key: set llm.api_key in the config file or OPENAI_API_KEY")?,
    };

    let provider: Arc<dyn LLMProvider> = Arc::new(OpenAiProvider::new(
        reqwest::Client::new(),
        api_key,
        config.llm.base_url.clone(),
    ));

    commands::chat::run(&config, provider).await
}
