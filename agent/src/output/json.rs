//! JSON report builder
//!
//! Builds the machine-readable report written by `--output`. Unlike the
//! console table it always carries not-mounted verdicts and every issue.

use exposure_kit::audit::{ClusterAudit, FileAudit, ScanIssue};

use super::OutputError;
use crate::config::ScanConfig;

/// Build the report for a cluster scan
pub fn build_cluster_report(
    audit: &ClusterAudit,
    config: &ScanConfig,
) -> Result<serde_json::Value, OutputError> {
    let summary = serde_json::json!({
        "namespaces_scanned": audit.namespaces_scanned,
        "workloads": audit.verdicts.len(),
        "mounted": audit.verdicts.iter().filter(|v| v.mounted).count(),
        "issues": audit.issues.len()
    });
    let results = serde_json::to_value(&audit.verdicts)?;
    Ok(envelope(config, summary, results, &audit.issues))
}

/// Build the report for a file or directory scan
pub fn build_file_report(
    audit: &FileAudit,
    config: &ScanConfig,
) -> Result<serde_json::Value, OutputError> {
    let summary = serde_json::json!({
        "files": audit.verdicts.len(),
        "mounted": audit.verdicts.iter().filter(|v| v.mounted).count(),
        "issues": audit.issues.len()
    });
    // Paths go through display() so non-UTF-8 names still serialize
    let results = audit
        .verdicts
        .iter()
        .map(|v| {
            serde_json::json!({
                "path": v.path.display().to_string(),
                "line": v.line,
                "mounted": v.mounted
            })
        })
        .collect();
    Ok(envelope(
        config,
        summary,
        serde_json::Value::Array(results),
        &audit.issues,
    ))
}

fn envelope(
    config: &ScanConfig,
    summary: serde_json::Value,
    results: serde_json::Value,
    issues: &[ScanIssue],
) -> serde_json::Value {
    let errors: Vec<String> = issues.iter().map(ToString::to_string).collect();

    serde_json::json!({
        "agent": {
            "name": "sockscan",
            "version": env!("CARGO_PKG_VERSION")
        },
        "run_id": uuid::Uuid::new_v4().to_string(),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "mode": config.mode.to_string(),
        "target": config.target,
        "summary": summary,
        "results": results,
        "errors": errors
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KubeSettings, ScanMode};
    use exposure_kit::audit::NamespaceSelector;
    use exposure_kit::cluster::ClusterError;
    use exposure_kit::model::{
        ControllerKind, ExposureVerdict, FileVerdict, MountEvidence, ResourceKind,
    };
    use std::path::PathBuf;

    fn config(mode: ScanMode) -> ScanConfig {
        ScanConfig {
            mode,
            target: "docker.sock".to_string(),
            verbose: false,
            exit_with_error: false,
            output_file: None,
            kube: KubeSettings::default(),
        }
    }

    #[test]
    fn test_cluster_report() {
        let audit = ClusterAudit {
            verdicts: vec![
                ExposureVerdict {
                    namespace: "default".into(),
                    kind: ResourceKind::Controller(ControllerKind::Deployment),
                    name: "web".into(),
                    mounted: true,
                    evidence: Some(MountEvidence {
                        index: 1,
                        volume: "dockersock".into(),
                        path: "/var/run/docker.sock".into(),
                    }),
                },
                ExposureVerdict {
                    namespace: "default".into(),
                    kind: ResourceKind::Pod,
                    name: "debug".into(),
                    mounted: false,
                    evidence: None,
                },
            ],
            issues: vec![ScanIssue::PodList {
                namespace: "locked".into(),
                source: ClusterError::AccessDenied("forbidden".into()),
            }],
            namespaces_scanned: 1,
        };

        let report =
            build_cluster_report(&audit, &config(ScanMode::Cluster(NamespaceSelector::All)))
                .unwrap();

        assert_eq!(report["mode"], "cluster");
        assert_eq!(report["target"], "docker.sock");
        assert_eq!(report["summary"]["workloads"], 2);
        assert_eq!(report["summary"]["mounted"], 1);
        assert_eq!(report["summary"]["issues"], 1);
        assert_eq!(report["results"][0]["kind"], "deployment");
        assert_eq!(report["results"][0]["evidence"]["path"], "/var/run/docker.sock");
        assert_eq!(report["results"][1]["kind"], "pod");
        assert_eq!(report["results"][1]["mounted"], false);
        assert!(report["errors"][0]
            .as_str()
            .unwrap()
            .starts_with("namespace locked"));
        assert_eq!(report["run_id"].as_str().unwrap().len(), 36);
        assert!(report["generated_at"].is_string());
    }

    #[test]
    fn test_file_report() {
        let audit = FileAudit {
            verdicts: vec![
                FileVerdict {
                    path: PathBuf::from("manifests/a.yaml"),
                    line: Some(12),
                    mounted: true,
                },
                FileVerdict {
                    path: PathBuf::from("manifests/b.yaml"),
                    line: None,
                    mounted: false,
                },
            ],
            issues: Vec::new(),
        };

        let report =
            build_file_report(&audit, &config(ScanMode::Files("manifests".into()))).unwrap();

        assert_eq!(report["mode"], "files");
        assert_eq!(report["summary"]["files"], 2);
        assert_eq!(report["results"][0]["path"], "manifests/a.yaml");
        assert_eq!(report["results"][0]["line"], 12);
        assert!(report["results"][1]["line"].is_null());
        assert_eq!(report["errors"].as_array().unwrap().len(), 0);
    }
}
