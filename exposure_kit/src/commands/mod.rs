//! Command execution configurations
//!
//! Provides whitelisted command executors for secure cluster scanning.

pub mod executor;
pub mod k8s;

pub use executor::{CommandError, CommandExecutor, CommandOutput};
pub use k8s::{create_k8s_command_executor, DEFAULT_K8S_TIMEOUT};
