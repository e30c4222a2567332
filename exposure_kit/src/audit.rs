//! # Audit API
//!
//! High-level entry points for a whole run:
//! - [`scan_cluster`] scans one namespace or all of them through a [`ClusterApi`]
//! - [`scan_path`] scans a file or directory tree as raw text
//!
//! Both separate fatal setup errors ([`AuditError`], returned as `Err`) from
//! per-item failures ([`ScanIssue`], collected next to the verdicts). Issues
//! never discard verdicts that were already produced.

use crate::cluster::{ClusterApi, ClusterError};
use crate::collectors::filesystem::{self, DiscoveryError};
use crate::model::{ExposureVerdict, FileVerdict};
use crate::resolver::ResolutionError;
use crate::scanner::NamespaceScanner;
use std::fmt;
use std::path::{Path, PathBuf};

/// Sentinel meaning "every namespace"
pub const ALL_NAMESPACES: &str = "ALL";

/// Which namespaces a cluster scan covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceSelector {
    All,
    Named(String),
}

impl NamespaceSelector {
    pub fn parse(value: &str) -> Self {
        if value == ALL_NAMESPACES {
            NamespaceSelector::All
        } else {
            NamespaceSelector::Named(value.to_string())
        }
    }
}

impl fmt::Display for NamespaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceSelector::All => write!(f, "{}", ALL_NAMESPACES),
            NamespaceSelector::Named(name) => write!(f, "{}", name),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("unable to list namespaces: {0}")]
    ListNamespaces(#[source] ClusterError),

    #[error("unable to fetch namespace {name:?}: {source}")]
    Namespace {
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// A non-fatal failure recorded during a run
#[derive(Debug, thiserror::Error)]
pub enum ScanIssue {
    #[error("namespace {namespace}: unable to fetch pods: {source}")]
    PodList {
        namespace: String,
        #[source]
        source: ClusterError,
    },

    #[error("namespace {namespace}: {source}")]
    Resolution {
        namespace: String,
        #[source]
        source: ResolutionError,
    },

    #[error("unable to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walk(DiscoveryError),
}

/// Several errors reported as one
///
/// Displays a single error as-is and several as `[first, second, ...]`.
#[derive(Debug)]
pub struct AggregateError<'a, E> {
    errors: &'a [E],
}

impl<'a, E> AggregateError<'a, E> {
    /// `None` when there is nothing to report
    pub fn new(errors: &'a [E]) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<E: fmt::Display> fmt::Display for AggregateError<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.errors {
            return write!(f, "{}", only);
        }
        write!(f, "[")?;
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", e)?;
        }
        write!(f, "]")
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for AggregateError<'_, E> {}

// ============================================================================
// Cluster audit
// ============================================================================

/// Result of a cluster scan
#[derive(Debug, Default)]
pub struct ClusterAudit {
    pub verdicts: Vec<ExposureVerdict>,
    pub issues: Vec<ScanIssue>,
    pub namespaces_scanned: usize,
}

impl ClusterAudit {
    pub fn exposure_found(&self) -> bool {
        self.verdicts.iter().any(|v| v.mounted)
    }

    pub fn error(&self) -> Option<AggregateError<'_, ScanIssue>> {
        AggregateError::new(&self.issues)
    }
}

/// Scan the selected namespaces for workloads mounting `target`
///
/// Namespaces are scanned one after another. A namespace whose pods cannot be
/// listed, or whose pods have broken owner chains, is recorded as an issue
/// and the run continues with the next namespace.
pub fn scan_cluster<C: ClusterApi + ?Sized>(
    client: &C,
    selector: &NamespaceSelector,
    target: &str,
) -> Result<ClusterAudit, AuditError> {
    let namespaces: Vec<String> = match selector {
        NamespaceSelector::Named(name) => {
            log::info!("user specified namespace: {}", name);
            let namespace = client
                .get_namespace(name)
                .map_err(|source| AuditError::Namespace {
                    name: name.clone(),
                    source,
                })?;
            vec![namespace.metadata.name]
        }
        NamespaceSelector::All => client
            .list_namespaces()
            .map_err(AuditError::ListNamespaces)?
            .into_iter()
            .map(|n| n.metadata.name)
            .collect(),
    };

    let scanner = NamespaceScanner::new(client, target);
    let mut audit = ClusterAudit::default();

    for namespace in &namespaces {
        match scanner.scan(namespace) {
            Ok(report) => {
                audit.namespaces_scanned += 1;
                audit.verdicts.extend(report.verdicts);
                audit
                    .issues
                    .extend(report.errors.into_iter().map(|source| ScanIssue::Resolution {
                        namespace: namespace.clone(),
                        source,
                    }));
            }
            Err(source) => {
                log::debug!("namespace {}: unable to fetch pods: {}", namespace, source);
                audit.issues.push(ScanIssue::PodList {
                    namespace: namespace.clone(),
                    source,
                });
            }
        }
    }

    Ok(audit)
}

// ============================================================================
// File audit
// ============================================================================

/// Result of a file or directory scan
#[derive(Debug, Default)]
pub struct FileAudit {
    pub verdicts: Vec<FileVerdict>,
    pub issues: Vec<ScanIssue>,
}

impl FileAudit {
    pub fn exposure_found(&self) -> bool {
        self.verdicts.iter().any(|v| v.mounted)
    }

    pub fn error(&self) -> Option<AggregateError<'_, ScanIssue>> {
        AggregateError::new(&self.issues)
    }
}

/// Search every file at or beneath `path` for `target`
///
/// A missing root path is fatal. Unreadable files are recorded as issues and
/// produce no verdict.
pub fn scan_path(path: &Path, target: &str) -> Result<FileAudit, AuditError> {
    let discovered = filesystem::discover_files(path)?;
    log::info!("scanning {} file(s) under {}", discovered.files.len(), path.display());

    let mut audit = FileAudit {
        verdicts: Vec::with_capacity(discovered.files.len()),
        issues: discovered.errors.into_iter().map(ScanIssue::Walk).collect(),
    };

    for file in discovered.files {
        match filesystem::search_file(&file, target) {
            Ok(line) => audit.verdicts.push(FileVerdict {
                path: file,
                line,
                mounted: line.is_some(),
            }),
            Err(source) => {
                log::debug!("unable to read {}: {}", file.display(), source);
                audit.issues.push(ScanIssue::FileRead { path: file, source });
            }
        }
    }

    Ok(audit)
}
