//! # sockscan
//!
//! Finds Kubernetes workloads, or manifest files, that mount the container
//! runtime socket.
//!
//! ## Usage
//!
//! ```bash
//! # Scan every namespace in the current kubeconfig context
//! sockscan
//!
//! # Scan one namespace, listing clean workloads too
//! sockscan -n kube-system -v
//!
//! # Scan manifests on disk and fail CI when the socket is referenced
//! sockscan -f deploy/ -e
//!
//! # Save the full report as JSON
//! sockscan -o report.json
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: scan completed (errors for individual namespaces or files are
//!   reported on stderr but do not fail the run)
//! - `1`: fatal error, or `--exit-with-error` and exposure was found

mod cli;
mod config;
mod output;
mod scanner;

use cli::{parse_args, CliResult};
use exposure_kit::logging;

fn main() {
    let exit_code = match parse_args(std::env::args_os()) {
        CliResult::Help(text) => {
            print!("{}", text);
            0
        }
        CliResult::Error(msg) => {
            eprintln!("{}", msg.trim_end());
            1
        }
        CliResult::Run(config) => run(config),
    };

    std::process::exit(exit_code);
}

/// Run the scan with the given configuration
fn run(config: config::ScanConfig) -> i32 {
    if let Err(e) = logging::init_logging(config.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        return 1;
    }

    match scanner::run_scan(&config) {
        Ok(summary) => summary.exit_code(config.exit_with_error),
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}
