//! Output generation module
//!
//! Provides builders for the two output formats:
//! - Console table (human-readable, stdout, aligned with `tabwriter`)
//! - JSON report (`--output`, full detail)
//!
//! Non-fatal errors are written to stderr after the table, as one line.

mod json;

pub use json::{build_cluster_report, build_file_report};

use std::io::{self, Write};

use exposure_kit::audit::{AggregateError, ScanIssue};
use exposure_kit::model::{ExposureVerdict, FileVerdict};
use tabwriter::TabWriter;

/// Spaces between aligned columns
const COLUMN_PADDING: usize = 3;

/// Write the `NAMESPACE TYPE NAME STATUS` table
///
/// Not-mounted workloads are listed only when `verbose` is set.
pub fn write_cluster_table<W: Write>(
    out: W,
    verdicts: &[ExposureVerdict],
    verbose: bool,
) -> io::Result<()> {
    let rows: Vec<Vec<String>> = verdicts
        .iter()
        .filter(|v| verbose || v.mounted)
        .map(|v| {
            vec![
                v.namespace.clone(),
                v.kind.label().to_string(),
                v.name.clone(),
                v.status().to_string(),
            ]
        })
        .collect();
    write_aligned(out, &["NAMESPACE", "TYPE", "NAME", "STATUS"], &rows)
}

/// Write the `FILE LINE STATUS` table
///
/// Files without a match show line `0` and are listed only when `verbose`
/// is set.
pub fn write_file_table<W: Write>(
    out: W,
    verdicts: &[FileVerdict],
    verbose: bool,
) -> io::Result<()> {
    let rows: Vec<Vec<String>> = verdicts
        .iter()
        .filter(|v| verbose || v.mounted)
        .map(|v| {
            vec![
                v.path.display().to_string(),
                v.line_or_sentinel().to_string(),
                v.status().to_string(),
            ]
        })
        .collect();
    write_aligned(out, &["FILE", "LINE", "STATUS"], &rows)
}

/// Tab-separate each row and let `TabWriter` align the columns.
/// The header is written even when there are no rows.
fn write_aligned<W: Write>(out: W, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut tw = TabWriter::new(out).padding(COLUMN_PADDING);
    writeln!(tw, "{}", headers.join("\t"))?;
    for row in rows {
        writeln!(tw, "{}", row.join("\t"))?;
    }
    tw.flush()
}

/// Write the aggregated error line, if there is anything to report
pub fn write_issues<W: Write>(out: &mut W, issues: &[ScanIssue]) -> io::Result<()> {
    if let Some(error) = AggregateError::new(issues) {
        writeln!(out, "error: {}", error)?;
    }
    Ok(())
}

/// Errors that can occur during output generation
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
