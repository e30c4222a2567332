//! # Cluster Access
//!
//! The read-only capability the audit consumes from a cluster: list and get
//! calls scoped by namespace, kind and name. [`crate::collectors::KubectlCollector`]
//! implements it on top of kubectl.

use crate::model::{CronJob, Namespace, Pod, ReplicaSet, Workload};

/// Failure of a single cluster lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    #[error("{kind} \"{name}\" not found in namespace \"{namespace}\"")]
    NotFound {
        namespace: String,
        kind: String,
        name: String,
    },

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("cluster request failed: {0}")]
    CommandFailed(String),

    #[error("failed to decode {what}: {reason}")]
    Parse { what: String, reason: String },
}

impl ClusterError {
    pub fn not_found(namespace: &str, kind: &str, name: &str) -> Self {
        ClusterError::NotFound {
            namespace: namespace.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}

/// Read-only view of a cluster
pub trait ClusterApi {
    fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError>;

    /// Fetch one namespace; `NotFound` when it does not exist
    fn get_namespace(&self, name: &str) -> Result<Namespace, ClusterError>;

    fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError>;

    fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ClusterError>;
    fn get_deployment(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError>;
    fn get_daemon_set(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError>;
    fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError>;
    fn get_job(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError>;
    fn get_cron_job(&self, namespace: &str, name: &str) -> Result<CronJob, ClusterError>;
}
