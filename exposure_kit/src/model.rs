//! # Workload Model
//!
//! Kubernetes object shapes as returned by `kubectl get -o json`, reduced to the
//! fields the exposure audit reads, plus the verdict types produced by a scan.
//!
//! Every struct tolerates missing fields (`#[serde(default)]`) so partially
//! populated API responses still decode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// API objects
// ============================================================================

/// Reference from an object to the object that owns it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
}

impl OwnerReference {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Object metadata subset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: Option<String>,
    pub owner_references: Vec<OwnerReference>,
}

impl ObjectMeta {
    /// The owner reference that decides ownership.
    ///
    /// Only the first entry is authoritative. Objects with several owners
    /// (shared ownership) are resolved through the first one only.
    pub fn primary_owner(&self) -> Option<&OwnerReference> {
        self.owner_references.first()
    }
}

/// Host path volume source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostPathVolumeSource {
    pub path: String,
}

/// A volume declared in a pod spec
///
/// Only the host path source is modelled; any other source type decodes with
/// `host_path: None` and is never relevant to exposure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Volume {
    pub name: String,
    pub host_path: Option<HostPathVolumeSource>,
}

impl Volume {
    pub fn host_path(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_path: Some(HostPathVolumeSource { path: path.into() }),
        }
    }

    pub fn empty_dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodSpec {
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodTemplateSpec {
    pub spec: PodSpec,
}

/// A running pod instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

impl Pod {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn has_volumes(&self) -> bool {
        !self.spec.volumes.is_empty()
    }
}

/// Spec shared by Deployment, DaemonSet, StatefulSet and Job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadSpec {
    pub template: PodTemplateSpec,
}

/// Any controller whose pod template sits at `spec.template`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workload {
    pub metadata: ObjectMeta,
    pub spec: WorkloadSpec,
}

pub type Deployment = Workload;
pub type DaemonSet = Workload;
pub type StatefulSet = Workload;
pub type Job = Workload;

/// ReplicaSets are only read for their owner reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaSet {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CronJobSpec {
    pub job_template: JobTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobTemplateSpec {
    pub spec: WorkloadSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CronJob {
    pub metadata: ObjectMeta,
    pub spec: CronJobSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Namespace {
    pub metadata: ObjectMeta,
}

impl Namespace {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// `kind: List` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

// ============================================================================
// Kinds
// ============================================================================

/// Owner kind of a pod, as named in its first owner reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerKind {
    ReplicaSet,
    DaemonSet,
    StatefulSet,
    Job,
    CronJob,
    Node,
    Unknown(String),
}

impl OwnerKind {
    /// Parse the `kind` string of an owner reference (case-sensitive)
    pub fn parse(kind: &str) -> Self {
        match kind {
            "ReplicaSet" => OwnerKind::ReplicaSet,
            "DaemonSet" => OwnerKind::DaemonSet,
            "StatefulSet" => OwnerKind::StatefulSet,
            "Job" => OwnerKind::Job,
            "CronJob" => OwnerKind::CronJob,
            "Node" => OwnerKind::Node,
            other => OwnerKind::Unknown(other.to_string()),
        }
    }
}

/// Kind of a top-level controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Deployment,
    DaemonSet,
    StatefulSet,
    Job,
    CronJob,
}

impl ControllerKind {
    pub const ALL: [ControllerKind; 5] = [
        ControllerKind::Deployment,
        ControllerKind::DaemonSet,
        ControllerKind::StatefulSet,
        ControllerKind::Job,
        ControllerKind::CronJob,
    ];

    /// Value shown in the TYPE column of the report
    pub fn label(&self) -> &'static str {
        match self {
            ControllerKind::Deployment => "deployment",
            ControllerKind::DaemonSet => "daemonset",
            ControllerKind::StatefulSet => "statefulset",
            ControllerKind::Job => "job",
            ControllerKind::CronJob => "cron",
        }
    }

    /// Resource name understood by `kubectl get`
    pub fn resource(&self) -> &'static str {
        match self {
            ControllerKind::Deployment => "deployments",
            ControllerKind::DaemonSet => "daemonsets",
            ControllerKind::StatefulSet => "statefulsets",
            ControllerKind::Job => "jobs",
            ControllerKind::CronJob => "cronjobs",
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Kind of the unit a verdict is reported for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Pod without an owner, reported on its own
    Pod,
    Controller(ControllerKind),
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "pod",
            ResourceKind::Controller(kind) => kind.label(),
        }
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Scan results
// ============================================================================

/// Top-level workload reached by following a pod's owner chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedController {
    pub namespace: String,
    pub kind: ControllerKind,
    pub name: String,
    /// Volumes of the controller's pod template
    pub volumes: Vec<Volume>,
}

impl ResolvedController {
    pub fn from_workload(namespace: &str, kind: ControllerKind, workload: Workload) -> Self {
        Self {
            namespace: namespace.to_string(),
            kind,
            name: workload.metadata.name,
            volumes: workload.spec.template.spec.volumes,
        }
    }

    pub fn from_cron_job(namespace: &str, cron_job: CronJob) -> Self {
        Self {
            namespace: namespace.to_string(),
            kind: ControllerKind::CronJob,
            name: cron_job.metadata.name,
            volumes: cron_job.spec.job_template.spec.template.spec.volumes,
        }
    }
}

/// The host path volume that matched the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountEvidence {
    /// Position of the volume in the declaration list
    pub index: usize,
    pub volume: String,
    pub path: String,
}

/// Exposure verdict for one workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposureVerdict {
    pub namespace: String,
    pub kind: ResourceKind,
    pub name: String,
    pub mounted: bool,
    pub evidence: Option<MountEvidence>,
}

impl ExposureVerdict {
    pub fn status(&self) -> &'static str {
        status_label(self.mounted)
    }
}

/// Exposure verdict for one scanned file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileVerdict {
    pub path: PathBuf,
    /// 1-based number of the first matching line
    pub line: Option<usize>,
    pub mounted: bool,
}

impl FileVerdict {
    /// Line number as reported, `0` when nothing matched
    pub fn line_or_sentinel(&self) -> usize {
        self.line.unwrap_or(0)
    }

    pub fn status(&self) -> &'static str {
        status_label(self.mounted)
    }
}

pub fn status_label(mounted: bool) -> &'static str {
    if mounted {
        "mounted"
    } else {
        "not-mounted"
    }
}
