//! Conversation driver: the automode loop.
//!
//! One session = one user request driven to completion:
//! 1. Send the history (plus the system prompt) to the model
//! 2. Print the assistant's reply
//! 3. Terminate on the completion phrase or when the round-trip budget is
//!    spent, evaluated before any tool dispatch
//! 4. Otherwise dispatch every tool call in order, append the results, and
//!    go again
//!
//! Background processes left in the registry are reaped when the session
//! ends, whether it terminated normally or not.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm::{ChatRequest, LLMError, LLMProvider, Message, Role, ToolCall, Usage};
use crate::process::ProcessRegistry;
use crate::prompts;
use crate::session::history::{self, HistoryError};
use crate::tools::{ToolError, ToolExecutor, ToolResult};

// ============================================================================
// Types
// ============================================================================

/// Why a session terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The assistant emitted the completion phrase.
    CompletionPhrase,
    /// The round-trip budget was exhausted.
    IterationBudget,
}

/// Result of a completed session.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Model round-trips made.
    pub iterations: u32,
    /// Accumulated token usage (the terminating round-trip is not counted).
    pub usage: TokenTally,
    pub reason: CompletionReason,
}

/// Running token counters, updated once per model round-trip.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenTally {
    pub input: u64,
    pub output: u64,
}

impl TokenTally {
    pub fn add(&mut self, usage: &Usage) {
        self.input += u64::from(usage.prompt_tokens);
        self.output += u64::from(usage.completion_tokens);
    }
}

/// Error from a session.
///
/// Only infrastructure failures land here; domain failures are rendered
/// into tool-result strings and fed back to the model.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("llm error: {0}")]
    Llm(#[from] LLMError),

    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("history error: {0}")]
    History(#[from] HistoryError),
}

// ============================================================================
// Public API
// ============================================================================

/// Run one automode session for `user_input`.
///
/// The registry must be fresh for this session; any processes still in it
/// when the loop ends are terminated before returning.
pub async fn run_session(
    provider: &dyn LLMProvider,
    executor: &ToolExecutor,
    registry: &ProcessRegistry,
    config: &Config,
    user_input: &str,
) -> Result<SessionOutcome, SessionError> {
    let result = drive(provider, executor, registry, config, user_input).await;

    let reaped = registry.terminate_all();
    if reaped > 0 {
        info!(reaped, "Terminated background processes at session end");
    }

    result
}

// ============================================================================
// Loop
// ============================================================================

async fn drive(
    provider: &dyn LLMProvider,
    executor: &ToolExecutor,
    registry: &ProcessRegistry,
    config: &Config,
    user_input: &str,
) -> Result<SessionOutcome, SessionError> {
    let max_iterations = config.session.max_iterations;
    let mut messages = vec![Message::text(Role::User, user_input)];
    let mut tally = TokenTally::default();
    let mut iterations = 0u32;

    loop {
        iterations += 1;

        let system = prompts::system_prompt(iterations, max_iterations);
        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        request_messages.push(Message::text(Role::System, system));
        request_messages.extend(messages.iter().cloned());

        debug!(
            iteration = iterations,
            max_iterations,
            messages_count = messages.len(),
            "Model round-trip"
        );
        let request = ChatRequest::with_tools(
            &config.llm.model,
            request_messages,
            config.llm.temperature,
            config.llm.max_tokens,
            executor.tool_definitions(),
        );
        let response = provider.chat(request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(LLMError::EmptyResponse)?;
        let assistant = choice.message;
        let content = assistant.content.clone().unwrap_or_default();

        if !content.is_empty() {
            println!("{}", content);
        }

        // Termination test comes before any dispatch; `>=` caps a session
        // at exactly `max_iterations` round-trips. Token accounting is
        // skipped on the terminating iteration.
        let reason = if content.contains(prompts::COMPLETION_PHRASE) {
            Some(CompletionReason::CompletionPhrase)
        } else if iterations >= max_iterations {
            Some(CompletionReason::IterationBudget)
        } else {
            None
        };
        if let Some(reason) = reason {
            history::save(&messages, &config.session.histories_dir).await?;
            return Ok(SessionOutcome {
                iterations,
                usage: tally,
                reason,
            });
        }

        if let Some(usage) = response.usage {
            tally.add(&usage);
            info!(input = tally.input, output = tally.output, "Token usage");
        }

        let tool_calls = assistant.tool_calls.clone().unwrap_or_default();
        messages.push(assistant);

        // Strictly in order, one result per call, even when the model
        // requested parallel execution.
        for tool_call in &tool_calls {
            let message = dispatch_tool_call(executor, registry, tool_call).await?;
            messages.push(message);
        }
    }
}

/// Dispatch one tool call, normalizing every outcome into a tool-result
/// message.
///
/// Unknown tools and argument-validation failures are rendered as result
/// strings; only environment failures propagate and abort the session.
async fn dispatch_tool_call(
    executor: &ToolExecutor,
    registry: &ProcessRegistry,
    tool_call: &ToolCall,
) -> Result<Message, SessionError> {
    let result = match executor.execute(tool_call).await {
        Ok(result) => result,
        Err(ToolError::UnknownTool(name)) => {
            warn!(tool = %name, "Unknown function called");
            ToolResult::error("Unknown function called.")
        }
        Err(ToolError::InvalidArguments(message)) => ToolResult::error(format!(
            "Invalid arguments for '{}': {}",
            tool_call.function.name, message
        )),
        Err(e @ ToolError::Environment(_)) => return Err(SessionError::Tool(e)),
    };

    let mut content = result.content;
    if let Some(id) = &result.process
        && registry.contains(id)
    {
        content.push_str("\n\nNote: The process is still running in the background.");
    }

    Ok(Message::tool_result(
        &tool_call.id,
        &tool_call.function.name,
        content,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_tally_accumulates_usage() {
        let mut tally = TokenTally::default();
        tally.add(&Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        tally.add(&Usage {
            prompt_tokens: 20,
            completion_tokens: 10,
            total_tokens: 30,
        });

        assert_eq!(tally.input, 30);
        assert_eq!(tally.output, 15);
    }
}
