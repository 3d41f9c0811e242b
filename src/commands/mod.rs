//! CLI commands.

pub mod chat;
