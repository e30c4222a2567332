//! Kubernetes Resource Collector
//!
//! Fetches Kubernetes objects via kubectl and decodes them into model types.

use crate::cluster::{ClusterApi, ClusterError};
use crate::commands::CommandExecutor;
use crate::model::{CronJob, Namespace, ObjectList, Pod, ReplicaSet, Workload};
use serde::de::DeserializeOwned;
use std::time::Duration;

const SERVICE_ACCOUNT_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const SERVICE_ACCOUNT_CA: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Collector for Kubernetes resources via kubectl
#[derive(Clone)]
pub struct KubectlCollector {
    executor: CommandExecutor,
    kubectl: Option<String>,
    kubeconfig: Option<String>,
    context: Option<String>,
    timeout: Option<Duration>,
}

impl KubectlCollector {
    /// Create new collector with the given executor
    pub fn new(executor: CommandExecutor) -> Self {
        Self {
            executor,
            kubectl: None,
            kubeconfig: None,
            context: None,
            timeout: None,
        }
    }

    /// Use an explicit kubectl binary instead of searching for one
    pub fn with_kubectl(mut self, path: impl Into<String>) -> Self {
        self.kubectl = Some(path.into());
        self
    }

    pub fn with_kubeconfig(mut self, path: impl Into<String>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Find kubeconfig path for out-of-cluster usage
    fn find_kubeconfig(&self) -> Option<String> {
        if let Some(explicit) = &self.kubeconfig {
            return Some(explicit.clone());
        }

        if let Ok(kubeconfig) = std::env::var("KUBECONFIG") {
            if std::path::Path::new(&kubeconfig).exists() {
                return Some(kubeconfig);
            }
        }

        if let Ok(home) = std::env::var("HOME") {
            let default_config = format!("{}/.kube/config", home);
            if std::path::Path::new(&default_config).exists() {
                return Some(default_config);
            }
        }

        None
    }

    /// Find kubectl binary path
    fn find_kubectl(&self) -> &str {
        if let Some(path) = &self.kubectl {
            return path;
        }
        for path in &["/usr/local/bin/kubectl", "/usr/bin/kubectl"] {
            if std::path::Path::new(path).exists() {
                return path;
            }
        }
        "kubectl" // Fall back to PATH lookup
    }

    /// Authentication arguments shared by every call
    fn auth_args(&self) -> Vec<String> {
        let mut args = vec![];

        // An explicit kubeconfig wins over in-cluster detection
        let in_cluster = self.kubeconfig.is_none();
        if let (true, Ok(host), Ok(port)) = (
            in_cluster,
            std::env::var("KUBERNETES_SERVICE_HOST"),
            std::env::var("KUBERNETES_SERVICE_PORT"),
        ) {
            // Running in-cluster - use explicit ServiceAccount auth
            args.push("--server".to_string());
            args.push(format!("https://{}:{}", host, port));

            if let Ok(token) = std::fs::read_to_string(SERVICE_ACCOUNT_TOKEN) {
                args.push("--token".to_string());
                args.push(token.trim().to_string());
            }

            if std::path::Path::new(SERVICE_ACCOUNT_CA).exists() {
                args.push("--certificate-authority".to_string());
                args.push(SERVICE_ACCOUNT_CA.to_string());
            }
        } else if let Some(kubeconfig) = self.find_kubeconfig() {
            // Running outside cluster - use kubeconfig
            args.push("--kubeconfig".to_string());
            args.push(kubeconfig);
        }

        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }

        args
    }

    /// Build kubectl command arguments
    fn build_kubectl_args(
        &self,
        resource: &str,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> Vec<String> {
        let mut args = self.auth_args();

        args.push("get".to_string());
        args.push(resource.to_string());

        if let Some(ns) = namespace {
            args.push("-n".to_string());
            args.push(ns.to_string());
        }

        if let Some(n) = name {
            args.push(n.to_string());
        }

        // Output as JSON
        args.push("-o".to_string());
        args.push("json".to_string());

        args
    }

    /// Execute kubectl and return its stdout
    fn execute_kubectl(
        &self,
        args: &[String],
        target: &Target<'_>,
    ) -> Result<String, ClusterError> {
        let args_str: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

        let kubectl_path = self.find_kubectl();
        let output = self
            .executor
            .execute(kubectl_path, &args_str, self.timeout)
            .map_err(|e| ClusterError::CommandFailed(format!("failed to execute kubectl: {}", e)))?;

        if output.exit_code != 0 {
            return Err(classify_failure(&output.stderr, target, output.exit_code));
        }

        Ok(output.stdout)
    }

    fn get_object<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        kind: &'static str,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<T, ClusterError> {
        let target = Target {
            kind,
            namespace: namespace.unwrap_or_default(),
            name,
        };
        let args = self.build_kubectl_args(resource, namespace, Some(name));
        let stdout = self.execute_kubectl(&args, &target)?;
        decode(&stdout, kind)
    }

    fn list_objects<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        kind: &'static str,
        namespace: Option<&str>,
    ) -> Result<Vec<T>, ClusterError> {
        let target = Target {
            kind,
            namespace: namespace.unwrap_or_default(),
            name: "",
        };
        let args = self.build_kubectl_args(resource, namespace, None);
        let stdout = self.execute_kubectl(&args, &target)?;
        let list: ObjectList<T> = decode(&stdout, kind)?;
        Ok(list.items)
    }
}

/// Object a kubectl call was about, for error messages
struct Target<'a> {
    kind: &'static str,
    namespace: &'a str,
    name: &'a str,
}

/// Map kubectl stderr to an error category
fn classify_failure(stderr: &str, target: &Target<'_>, exit_code: i32) -> ClusterError {
    let stderr = stderr.trim();
    if stderr.contains("(NotFound)") || stderr.contains("not found") {
        ClusterError::not_found(target.namespace, target.kind, target.name)
    } else if stderr.contains("(Forbidden)") || stderr.contains("(Unauthorized)") {
        ClusterError::AccessDenied(stderr.to_string())
    } else {
        ClusterError::CommandFailed(format!("kubectl failed (exit {}): {}", exit_code, stderr))
    }
}

fn decode<T: DeserializeOwned>(stdout: &str, what: &str) -> Result<T, ClusterError> {
    serde_json::from_str(stdout).map_err(|e| ClusterError::Parse {
        what: what.to_string(),
        reason: e.to_string(),
    })
}

impl ClusterApi for KubectlCollector {
    fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        self.list_objects("namespaces", "Namespace", None)
    }

    fn get_namespace(&self, name: &str) -> Result<Namespace, ClusterError> {
        self.get_object("namespace", "Namespace", None, name)
    }

    fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        self.list_objects("pods", "Pod", Some(namespace))
    }

    fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ClusterError> {
        self.get_object("replicasets", "ReplicaSet", Some(namespace), name)
    }

    fn get_deployment(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError> {
        self.get_object("deployments", "Deployment", Some(namespace), name)
    }

    fn get_daemon_set(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError> {
        self.get_object("daemonsets", "DaemonSet", Some(namespace), name)
    }

    fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError> {
        self.get_object("statefulsets", "StatefulSet", Some(namespace), name)
    }

    fn get_job(&self, namespace: &str, name: &str) -> Result<Workload, ClusterError> {
        self.get_object("jobs", "Job", Some(namespace), name)
    }

    fn get_cron_job(&self, namespace: &str, name: &str) -> Result<CronJob, ClusterError> {
        self.get_object("cronjobs", "CronJob", Some(namespace), name)
    }
}
