//! Kubernetes command executor configuration
//!
//! Provides a whitelisted command executor for cluster audits.

use super::CommandExecutor;
use std::time::Duration;

/// Default per-call timeout for kubectl
pub const DEFAULT_K8S_TIMEOUT: Duration = Duration::from_secs(30);

/// Create command executor configured for Kubernetes scanning
///
/// Whitelist includes:
/// - kubectl: Kubernetes CLI (multiple paths for container compatibility)
/// - `extra`: a user-configured kubectl binary, if any
///
/// Uses a longer timeout since K8s API calls can be slower than local commands.
pub fn create_k8s_command_executor(
    timeout: Option<Duration>,
    extra: Option<&str>,
) -> CommandExecutor {
    let mut executor = CommandExecutor::with_timeout(timeout.unwrap_or(DEFAULT_K8S_TIMEOUT));

    executor.allow_commands(&[
        "kubectl",                // Standard PATH lookup
        "/usr/local/bin/kubectl", // Common container location
        "/usr/bin/kubectl",       // Alternative location
    ]);

    if let Some(path) = extra {
        executor.allow_commands(&[path]);
    }

    executor
}
