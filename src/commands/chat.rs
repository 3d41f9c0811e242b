//! Interactive chat loop.
//!
//! Each line of user input starts a fresh automode session: empty history
//! seeded with the message, a new process registry, and the iteration
//! counter at zero.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{Instrument, info, info_span};

use crate::config::Config;
use crate::llm::LLMProvider;
use crate::process::ProcessRegistry;
use crate::session::{self, CompletionReason};
use crate::tools::build_executor;

/// Run the interactive loop until the user quits.
pub async fn run(config: &Config, provider: Arc<dyn LLMProvider>) -> Result<()> {
    println!("Welcome to autodev.");
    println!("Describe a task, or type 'quit' to exit.");
    println!("Model: {}", config.llm.model);
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let Some(input) = lines.next_line().await? else {
            println!();
            break;
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") {
            break;
        }

        run_one_session(config, provider.as_ref(), input).await?;
    }

    Ok(())
}

/// Run a single session with fresh state.
async fn run_one_session(
    config: &Config,
    provider: &dyn LLMProvider,
    input: &str,
) -> Result<()> {
    let session_id = ulid::Ulid::new().to_string().to_lowercase();
    let span = info_span!("session", id = %session_id);

    async {
        let registry = Arc::new(ProcessRegistry::new());
        let executor = build_executor(
            registry.clone(),
            config.session.workdir.clone(),
            Duration::from_secs(config.session.execute_timeout_seconds),
        );

        let outcome = session::run_session(provider, &executor, &registry, config, input)
            .await
            .context("session aborted")?;

        match outcome.reason {
            CompletionReason::CompletionPhrase => {
                info!(iterations = outcome.iterations, "Session completed")
            }
            CompletionReason::IterationBudget => {
                info!(iterations = outcome.iterations, "Iteration budget reached")
            }
        }
        info!(
            input_tokens = outcome.usage.input,
            output_tokens = outcome.usage.output,
            "Session token totals"
        );

        Ok(())
    }
    .instrument(span)
    .await
}
