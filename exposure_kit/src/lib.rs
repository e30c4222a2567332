//! # Exposure Kit
//!
//! Finds workloads that mount a sensitive host path, by default the container
//! runtime socket `docker.sock`, and reports one verdict per owning workload.
//!
//! ## Modules
//!
//! - `model` - Kubernetes object shapes and verdict types
//! - `cluster` - The read-only cluster capability the audit consumes
//! - `collectors` - kubectl-backed cluster access and file discovery
//! - `commands` - Whitelisted command execution
//! - `resolver` - Pod owner chain resolution
//! - `aggregator` - Per-namespace controller deduplication
//! - `inspector` - Host path volume matching
//! - `scanner` - One-namespace scan driver
//! - `audit` - Whole-run cluster and file scans
//! - `logging` - `env_logger` setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use exposure_kit::audit::{scan_cluster, NamespaceSelector};
//! use exposure_kit::collectors::KubectlCollector;
//! use exposure_kit::commands::create_k8s_command_executor;
//!
//! let client = KubectlCollector::new(create_k8s_command_executor(None, None));
//! let audit = scan_cluster(&client, &NamespaceSelector::All, "docker.sock")?;
//! for verdict in audit.verdicts.iter().filter(|v| v.mounted) {
//!     println!("{} {} {}", verdict.namespace, verdict.kind, verdict.name);
//! }
//! ```

pub mod aggregator;
pub mod audit;
pub mod cluster;
pub mod collectors;
pub mod commands;
pub mod inspector;
pub mod logging;
pub mod model;
pub mod resolver;
pub mod scanner;
