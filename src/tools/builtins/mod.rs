//! Built-in tool implementations.

pub(crate) mod execute_code;
pub(crate) mod files;
pub(crate) mod stop_process;
