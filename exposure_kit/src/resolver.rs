//! # Owner Resolution
//!
//! Follows a pod's owner reference up to the top-level controller that
//! defines its pod template.
//!
//! ```text
//! Pod ──► ReplicaSet ──► Deployment
//! Pod ──► DaemonSet | StatefulSet
//! Pod ──► Job ──► CronJob          (Job is top-level when it has no owner)
//! Pod ──► Node                      (static pod, not audited)
//! ```
//!
//! Chains are at most two hops long. Only the first owner reference of each
//! object is consulted.

use crate::cluster::{ClusterApi, ClusterError};
use crate::model::{ControllerKind, OwnerKind, OwnerReference, Pod, ResolvedController};

/// Why an owner chain could not be followed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("pod {pod}: {source}")]
    Lookup {
        pod: String,
        #[source]
        source: ClusterError,
    },

    #[error("pod {pod}: {kind} \"{name}\" in namespace \"{namespace}\" has no {expected} owner")]
    BrokenChain {
        pod: String,
        namespace: String,
        kind: &'static str,
        name: String,
        expected: &'static str,
    },
}

/// Outcome of resolving one pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedOutcome {
    Controller(ResolvedController),
    /// No owner reference; the pod itself is audited
    Unowned,
    /// Owned by a node
    StaticPod,
    UnknownOwnerKind { kind: String, pod: String },
    ResolutionFailed(ResolutionError),
}

/// Resolves pods to their top-level controllers through a [`ClusterApi`]
pub struct OwnerResolver<'a, C: ClusterApi + ?Sized> {
    client: &'a C,
}

impl<'a, C: ClusterApi + ?Sized> OwnerResolver<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn resolve(&self, namespace: &str, pod: &Pod) -> ResolvedOutcome {
        let owner = match pod.metadata.primary_owner() {
            Some(owner) => owner,
            None => return ResolvedOutcome::Unowned,
        };

        let result = match OwnerKind::parse(&owner.kind) {
            OwnerKind::ReplicaSet => self.resolve_replica_set(namespace, pod, owner),
            OwnerKind::DaemonSet => self.resolve_daemon_set(namespace, pod, owner),
            OwnerKind::StatefulSet => self.resolve_stateful_set(namespace, pod, owner),
            OwnerKind::Job => self.resolve_job(namespace, pod, owner),
            OwnerKind::CronJob => self.resolve_cron_job(namespace, pod, &owner.name),
            OwnerKind::Node => return ResolvedOutcome::StaticPod,
            OwnerKind::Unknown(kind) => {
                return ResolvedOutcome::UnknownOwnerKind {
                    kind,
                    pod: pod.name().to_string(),
                }
            }
        };

        match result {
            Ok(controller) => ResolvedOutcome::Controller(controller),
            Err(e) => {
                log::debug!("owner resolution failed: {}", e);
                ResolvedOutcome::ResolutionFailed(e)
            }
        }
    }

    /// ReplicaSet is never top-level: its owner must be a Deployment
    fn resolve_replica_set(
        &self,
        namespace: &str,
        pod: &Pod,
        owner: &OwnerReference,
    ) -> Result<ResolvedController, ResolutionError> {
        let replica_set = self
            .client
            .get_replica_set(namespace, &owner.name)
            .map_err(|e| lookup_failed(pod, e))?;

        let deployment_ref = replica_set
            .metadata
            .primary_owner()
            .filter(|r| r.kind == "Deployment")
            .ok_or_else(|| ResolutionError::BrokenChain {
                pod: pod.name().to_string(),
                namespace: namespace.to_string(),
                kind: "ReplicaSet",
                name: owner.name.clone(),
                expected: "Deployment",
            })?;

        let deployment = self
            .client
            .get_deployment(namespace, &deployment_ref.name)
            .map_err(|e| lookup_failed(pod, e))?;

        Ok(ResolvedController::from_workload(
            namespace,
            ControllerKind::Deployment,
            deployment,
        ))
    }

    fn resolve_daemon_set(
        &self,
        namespace: &str,
        pod: &Pod,
        owner: &OwnerReference,
    ) -> Result<ResolvedController, ResolutionError> {
        let daemon_set = self
            .client
            .get_daemon_set(namespace, &owner.name)
            .map_err(|e| lookup_failed(pod, e))?;
        Ok(ResolvedController::from_workload(
            namespace,
            ControllerKind::DaemonSet,
            daemon_set,
        ))
    }

    fn resolve_stateful_set(
        &self,
        namespace: &str,
        pod: &Pod,
        owner: &OwnerReference,
    ) -> Result<ResolvedController, ResolutionError> {
        let stateful_set = self
            .client
            .get_stateful_set(namespace, &owner.name)
            .map_err(|e| lookup_failed(pod, e))?;
        Ok(ResolvedController::from_workload(
            namespace,
            ControllerKind::StatefulSet,
            stateful_set,
        ))
    }

    /// A Job with an owner belongs to a CronJob, which is then top-level
    fn resolve_job(
        &self,
        namespace: &str,
        pod: &Pod,
        owner: &OwnerReference,
    ) -> Result<ResolvedController, ResolutionError> {
        let job = self
            .client
            .get_job(namespace, &owner.name)
            .map_err(|e| lookup_failed(pod, e))?;

        match job.metadata.primary_owner().map(|r| r.name.clone()) {
            None => Ok(ResolvedController::from_workload(
                namespace,
                ControllerKind::Job,
                job,
            )),
            Some(cron_name) => self.resolve_cron_job(namespace, pod, &cron_name),
        }
    }

    fn resolve_cron_job(
        &self,
        namespace: &str,
        pod: &Pod,
        name: &str,
    ) -> Result<ResolvedController, ResolutionError> {
        let cron_job = self
            .client
            .get_cron_job(namespace, name)
            .map_err(|e| lookup_failed(pod, e))?;
        Ok(ResolvedController::from_cron_job(namespace, cron_job))
    }
}

fn lookup_failed(pod: &Pod, source: ClusterError) -> ResolutionError {
    ResolutionError::Lookup {
        pod: pod.name().to_string(),
        source,
    }
}
