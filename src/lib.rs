//! autodev - a conversational coding agent.
//!
//! The agent loops between an OpenAI-compatible chat endpoint and a fixed
//! set of tools: project file operations, code execution in an isolated
//! Python environment, and lifecycle control over background processes
//! spawned by that execution.

pub mod commands;
pub mod config;
pub mod environment;
pub mod llm;
pub mod process;
pub mod prompts;
pub mod session;
pub mod tools;
