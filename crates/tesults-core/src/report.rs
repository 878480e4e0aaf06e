//! Run-end assembly and upload of the report.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::attachments::{self, FileLister};
use crate::config::{BuildRecord, Settings};
use crate::client::ResultsSink;
use crate::error::{ReportError, ReportResult};
use crate::model::{Metadata, Report, Results, SubmitStatus, TestCase};
use crate::session::Session;

/// Suite name given to the synthetic build case.
pub const BUILD_SUITE: &str = "[build]";

/// What happened at run end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Reporting disabled or nothing was recorded; no request was made.
    NoResults,
    Submitted(SubmitStatus),
}

impl UploadOutcome {
    /// `false` only when the service rejected the upload.
    pub fn is_success(&self) -> bool {
        match self {
            Self::NoResults => true,
            Self::Submitted(status) => status.success,
        }
    }

    /// Human-readable summary, one line per entry.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::NoResults => vec!["No test results.".to_string()],
            Self::Submitted(status) => {
                let mut lines = vec![
                    format!("success: {}", status.success),
                    format!("message: {}", status.message),
                    format!("warnings: {}", status.warnings.len()),
                ];
                lines.extend(status.warnings.iter().map(|w| format!("  - {w}")));
                lines.push(format!("errors: {}", status.errors.len()));
                lines.extend(status.errors.iter().map(|e| format!("  - {e}")));
                lines
            }
        }
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// The synthetic case summarizing the build.
pub fn build_case(
    build: &BuildRecord,
    lister: &dyn FileLister,
    attachment_root: Option<&Path>,
) -> TestCase {
    let mut case = TestCase::new(build.name.clone(), build.result);
    case.suite = Some(BUILD_SUITE.to_string());
    case.desc = build.description.clone();
    case.reason = build.reason.clone();
    case.files = attachments::discover(lister, attachment_root, Some(BUILD_SUITE), &build.name);
    case
}

/// Build the payload from the session, or `None` when there is nothing to send.
///
/// The build case, if configured, is always last.
pub fn assemble(session: Session, lister: &dyn FileLister) -> Option<Report> {
    assemble_with(session, lister, Metadata::default())
}

pub fn assemble_with(
    session: Session,
    lister: &dyn FileLister,
    metadata: Metadata,
) -> Option<Report> {
    let (settings, mut cases) = session.into_cases();
    if !has_results(&settings, &cases) {
        return None;
    }
    if let Some(build) = &settings.build {
        cases.push(build_case(build, lister, settings.attachment_root.as_deref()));
    }
    Some(Report {
        target: settings.target,
        results: Results { cases },
        metadata,
    })
}

/// Assemble and submit once. Never retried.
pub async fn upload(
    session: Session,
    lister: &dyn FileLister,
    sink: &dyn ResultsSink,
) -> ReportResult<UploadOutcome> {
    match assemble(session, lister) {
        Some(report) => submit(&report, sink).await,
        None => {
            info!("no test results to upload");
            Ok(UploadOutcome::NoResults)
        }
    }
}

pub async fn submit(report: &Report, sink: &dyn ResultsSink) -> ReportResult<UploadOutcome> {
    info!(cases = report.results.cases.len(), "Tesults results uploading...");
    let status = sink.submit(report).await?;
    if status.success {
        info!(message = %status.message, warnings = status.warnings.len(), "upload accepted");
    } else {
        warn!(message = %status.message, errors = status.errors.len(), "upload rejected");
    }
    Ok(UploadOutcome::Submitted(status))
}

/// Whether the session would produce a report at all.
pub fn has_results(settings: &Settings, cases: &[TestCase]) -> bool {
    settings.enabled && !cases.is_empty()
}

/// Write the payload as pretty JSON.
pub fn write_payload(report: &Report, out: &Path) -> ReportResult<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(out, json).map_err(|e| ReportError::io(out, e))?;
    Ok(())
}
