//! # Data Collectors Module

pub mod filesystem;
pub mod k8s_resource;

pub use filesystem::{discover_files, search_file, DiscoveryError, Discovered};
pub use k8s_resource::KubectlCollector;
