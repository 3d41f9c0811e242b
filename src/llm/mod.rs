//! LLM chat completions: types, provider trait, and the OpenAI-compatible client.

mod error;
mod openai;
mod provider;
mod types;

pub use error::LLMError;
pub use openai::OpenAiProvider;
pub use provider::LLMProvider;
pub use types::{
    ChatRequest, ChatResponse, Choice, FunctionCall, FunctionDefinition, Message, Role, ToolCall,
    ToolDefinition, Usage,
};
