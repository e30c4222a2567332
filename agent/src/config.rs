//! Configuration types for the sockscan agent
//!
//! Defines the configuration structures used throughout the agent, and the
//! optional TOML file that supplies defaults for command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use exposure_kit::audit::NamespaceSelector;
use serde::Deserialize;

/// Longest accepted per-request timeout, in seconds
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

/// What a run scans
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Live cluster through kubectl
    Cluster(NamespaceSelector),
    /// File or directory as raw text
    Files(PathBuf),
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Cluster(_) => write!(f, "cluster"),
            ScanMode::Files(_) => write!(f, "files"),
        }
    }
}

/// How to reach the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeSettings {
    /// kubectl binary (None means search the usual locations)
    pub kubectl: Option<String>,
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
    pub request_timeout: Option<Duration>,
}

/// Configuration for a scan run
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub mode: ScanMode,

    /// Substring searched for in host paths and file lines
    pub target: String,

    /// Include not-mounted rows in the report
    pub verbose: bool,

    /// Exit with 1 when any exposure is found
    pub exit_with_error: bool,

    /// JSON report path (None means console-only output)
    pub output_file: Option<PathBuf>,

    pub kube: KubeSettings,
}

/// Defaults read from `--config <file>`
///
/// ```toml
/// target = "containerd.sock"
/// kubectl = "/opt/bin/kubectl"
/// kubeconfig = "/etc/sockscan/kubeconfig"
/// context = "prod"
/// request_timeout_secs = 60
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub target: Option<String>,
    pub kubectl: Option<String>,
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Errors in the run configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("target must not be empty")]
    EmptyTarget,

    #[error("error loading kubeconfig: {0} does not exist")]
    KubeconfigMissing(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error(
        "request timeout of {0}s exceeds the maximum of {max}s",
        max = MAX_REQUEST_TIMEOUT_SECS
    )]
    TimeoutTooLarge(u64),
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Any workload or file mounts the target
    pub exposure_found: bool,

    /// Verdicts produced (before verbose filtering)
    pub verdicts: usize,

    /// Non-fatal errors reported after the table
    pub issues: usize,
}

impl RunSummary {
    /// Get the exit code based on results
    ///
    /// Non-fatal issues never change the exit code.
    pub fn exit_code(&self, exit_with_error: bool) -> i32 {
        if exit_with_error && self.exposure_found {
            1
        } else {
            0
        }
    }
}
