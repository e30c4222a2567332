//! Command-line interface parsing
//!
//! Flag names are a stable contract; scripts depend on them.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use exposure_kit::audit::{NamespaceSelector, ALL_NAMESPACES};
use exposure_kit::inspector::DEFAULT_TARGET;

use crate::config::{
    ConfigError, FileConfig, KubeSettings, ScanConfig, ScanMode, MAX_REQUEST_TIMEOUT_SECS,
};

/// Find workloads that mount the container runtime socket
#[derive(Debug, Parser)]
#[command(name = "sockscan", version)]
pub struct Cli {
    /// Namespace to search for pods
    #[arg(short = 'n', long, default_value = ALL_NAMESPACES)]
    pub namespace: String,

    /// File or directory to scan instead of a cluster
    #[arg(short = 'f', long = "filename")]
    pub filename: Option<PathBuf>,

    /// Exit with error code if the target is found
    #[arg(short = 'e', long = "exit-with-error")]
    pub exit_with_error: bool,

    /// Show not-mounted results and info logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Substring to look for [default: docker.sock]
    #[arg(short = 't', long, env = "SOCKSCAN_TARGET")]
    pub target: Option<String>,

    /// Also write the full report as JSON to this file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Path to the kubeconfig file to use
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Name of the kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// kubectl binary to run
    #[arg(long)]
    pub kubectl: Option<String>,

    /// Seconds to wait for each cluster request
    #[arg(long = "request-timeout", value_name = "SECS")]
    pub request_timeout: Option<u64>,

    /// TOML file with defaults for the options above
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// CLI parsing result
pub enum CliResult {
    /// Run scan with this configuration
    Run(ScanConfig),
    /// Help or version text, printed to stdout before exiting 0
    Help(String),
    /// Error message, already prefixed with `error:`
    Error(String),
}

/// Parse command-line arguments
pub fn parse_args<I, T>(args: I) -> CliResult
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return CliResult::Help(e.to_string());
        }
        Err(e) => return CliResult::Error(e.to_string()),
    };

    match cli.into_config() {
        Ok(config) => CliResult::Run(config),
        Err(e) => CliResult::Error(format!("error: {}", e)),
    }
}

impl Cli {
    /// Merge flags over the optional config file into a run configuration
    pub fn into_config(self) -> Result<ScanConfig, ConfigError> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let target = self
            .target
            .or(file.target)
            .unwrap_or_else(|| DEFAULT_TARGET.to_string());
        if target.is_empty() {
            return Err(ConfigError::EmptyTarget);
        }

        let mode = match self.filename {
            Some(path) => ScanMode::Files(path),
            None => ScanMode::Cluster(NamespaceSelector::parse(&self.namespace)),
        };

        let kubeconfig = self.kubeconfig.or(file.kubeconfig);
        if let (ScanMode::Cluster(_), Some(path)) = (&mode, &kubeconfig) {
            if !std::path::Path::new(path).exists() {
                return Err(ConfigError::KubeconfigMissing(path.clone()));
            }
        }

        let request_timeout = match self.request_timeout.or(file.request_timeout_secs) {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) if secs > MAX_REQUEST_TIMEOUT_SECS => {
                return Err(ConfigError::TimeoutTooLarge(secs));
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(ScanConfig {
            mode,
            target,
            verbose: self.verbose,
            exit_with_error: self.exit_with_error,
            output_file: self.output,
            kube: KubeSettings {
                kubectl: self.kubectl.or(file.kubectl),
                kubeconfig,
                context: self.context.or(file.context),
                request_timeout,
            },
        })
    }
}
