//! Core scanning logic
//!
//! Runs a cluster or file scan, prints the report, and collects the outcome.

use std::io;
use std::path::Path;
use std::time::Instant;

use exposure_kit::audit::{scan_cluster, scan_path, AuditError, NamespaceSelector, ScanIssue};
use exposure_kit::collectors::KubectlCollector;
use exposure_kit::commands::create_k8s_command_executor;

use crate::config::{KubeSettings, RunSummary, ScanConfig, ScanMode};
use crate::output::{self, OutputError};

/// Run a scan with the given configuration
pub fn run_scan(config: &ScanConfig) -> Result<RunSummary, ScanError> {
    let start = Instant::now();

    let summary = match &config.mode {
        ScanMode::Cluster(selector) => run_cluster_scan(config, selector)?,
        ScanMode::Files(path) => run_file_scan(config, path)?,
    };

    log::info!(
        "scan completed in {:.2}s: {} result(s), exposure found: {}, {} error(s)",
        start.elapsed().as_secs_f64(),
        summary.verdicts,
        summary.exposure_found,
        summary.issues
    );

    Ok(summary)
}

fn run_cluster_scan(
    config: &ScanConfig,
    selector: &NamespaceSelector,
) -> Result<RunSummary, ScanError> {
    log::info!("searching namespace {} for {}", selector, config.target);

    let client = create_client(&config.kube);
    let audit = scan_cluster(&client, selector, &config.target)?;

    output::write_cluster_table(io::stdout().lock(), &audit.verdicts, config.verbose)
        .map_err(ScanError::Console)?;
    let report = match &config.output_file {
        Some(_) => Some(output::build_cluster_report(&audit, config)?),
        None => None,
    };
    finish(config, report, &audit.issues)?;

    Ok(RunSummary {
        exposure_found: audit.exposure_found(),
        verdicts: audit.verdicts.len(),
        issues: audit.issues.len(),
    })
}

fn run_file_scan(config: &ScanConfig, path: &Path) -> Result<RunSummary, ScanError> {
    log::info!("searching {} for {}", path.display(), config.target);

    let audit = scan_path(path, &config.target)?;

    output::write_file_table(io::stdout().lock(), &audit.verdicts, config.verbose)
        .map_err(ScanError::Console)?;
    let report = match &config.output_file {
        Some(_) => Some(output::build_file_report(&audit, config)?),
        None => None,
    };
    finish(config, report, &audit.issues)?;

    Ok(RunSummary {
        exposure_found: audit.exposure_found(),
        verdicts: audit.verdicts.len(),
        issues: audit.issues.len(),
    })
}

/// Create the kubectl-backed cluster client
fn create_client(kube: &KubeSettings) -> KubectlCollector {
    let executor = create_k8s_command_executor(kube.request_timeout, kube.kubectl.as_deref());
    let mut client = KubectlCollector::new(executor);

    if let Some(kubectl) = &kube.kubectl {
        client = client.with_kubectl(kubectl.as_str());
    }
    if let Some(kubeconfig) = &kube.kubeconfig {
        client = client.with_kubeconfig(kubeconfig.as_str());
    }
    if let Some(context) = &kube.context {
        client = client.with_context(context.as_str());
    }
    if let Some(timeout) = kube.request_timeout {
        client = client.with_timeout(timeout);
    }

    client
}

/// Save the JSON report, then print the error line after the table
fn finish(
    config: &ScanConfig,
    report: Option<serde_json::Value>,
    issues: &[ScanIssue],
) -> Result<(), ScanError> {
    if let (Some(path), Some(report)) = (&config.output_file, report) {
        save_output(path, &report)?;
        log::info!("results saved to {}", path.display());
    }

    output::write_issues(&mut io::stderr().lock(), issues).map_err(ScanError::Console)
}

/// Save output to file
fn save_output(path: &Path, report: &serde_json::Value) -> Result<(), ScanError> {
    let json = serde_json::to_string_pretty(report).map_err(OutputError::from)?;

    std::fs::write(path, json)
        .map_err(|e| ScanError::WriteFile(path.display().to_string(), e))
}

/// Errors that end a run
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("output generation failed: {0}")]
    Output(#[from] OutputError),

    #[error("failed to write {0}: {1}")]
    WriteFile(String, #[source] io::Error),

    #[error("failed to write report: {0}")]
    Console(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn file_config(path: PathBuf, output_file: Option<PathBuf>) -> ScanConfig {
        ScanConfig {
            mode: ScanMode::Files(path),
            target: "docker.sock".to_string(),
            verbose: false,
            exit_with_error: true,
            output_file,
            kube: KubeSettings::default(),
        }
    }

    #[test]
    fn test_file_scan_summary() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("clean.yaml"), "kind: Pod\n").unwrap();
        fs::write(
            dir.path().join("exposed.yaml"),
            "kind: Pod\nspec:\n  volumes:\n  - hostPath:\n      path: /var/run/docker.sock\n",
        )
        .unwrap();

        let summary = run_scan(&file_config(dir.path().to_path_buf(), None)).unwrap();
        assert!(summary.exposure_found);
        assert_eq!(summary.verdicts, 2);
        assert_eq!(summary.issues, 0);
        assert_eq!(summary.exit_code(true), 1);
    }

    #[test]
    fn test_file_scan_writes_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let manifests = dir.path().join("manifests");
        fs::create_dir(&manifests).unwrap();
        fs::write(manifests.join("pod.yaml"), "kind: Pod\n").unwrap();
        let report_path = dir.path().join("report.json");

        let summary = run_scan(&file_config(manifests, Some(report_path.clone()))).unwrap();
        assert!(!summary.exposure_found);
        assert_eq!(summary.exit_code(true), 0);

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["mode"], "files");
        assert_eq!(report["summary"]["files"], 1);
        assert_eq!(report["results"][0]["mounted"], false);
    }

    #[test]
    fn test_missing_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_scan(&file_config(dir.path().join("absent"), None)).unwrap_err();
        assert!(matches!(err, ScanError::Audit(AuditError::Discovery(_))));
        assert!(err.to_string().starts_with("unable to open file"));
    }

    #[test]
    fn test_unwritable_report_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pod.yaml"), "kind: Pod\n").unwrap();
        let report_path = dir.path().join("missing-dir").join("report.json");

        let err = run_scan(&file_config(dir.path().join("pod.yaml"), Some(report_path)))
            .unwrap_err();
        assert!(matches!(err, ScanError::WriteFile(..)));
    }

    #[test]
    fn test_create_client_accepts_all_settings() {
        let kube = KubeSettings {
            kubectl: Some("/opt/k8s/kubectl".to_string()),
            kubeconfig: Some("/etc/kubeconfig".to_string()),
            context: Some("prod".to_string()),
            request_timeout: Some(std::time::Duration::from_secs(5)),
        };
        // Construction never touches the cluster
        let _client = create_client(&kube);
    }
}
