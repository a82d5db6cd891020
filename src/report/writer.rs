//! Report persistence.
//!
//! The model's answer is written verbatim to
//! `<output_dir>/<prefix>-<YYYY-MM-DD-HH-MM-SS>.md`.

use crate::error::AuditError;
use chrono::{DateTime, Local};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_OUTPUT_DIR: &str = "docs/agents/dependency-auditor";
pub const DEFAULT_FILE_PREFIX: &str = "dependencies-report";

/// Second precision, filesystem-safe on every platform.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Writes timestamped Markdown reports.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    file_prefix: String,
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR, DEFAULT_FILE_PREFIX)
    }
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_prefix: file_prefix.into(),
        }
    }

    /// Report path for a given creation time.
    pub fn path_for(&self, created: &DateTime<Local>) -> PathBuf {
        self.output_dir.join(format!(
            "{}-{}.md",
            self.file_prefix,
            created.format(TIMESTAMP_FORMAT)
        ))
    }

    /// Write `text` stamped with the current local time.
    pub fn write(&self, text: &str) -> Result<PathBuf, AuditError> {
        self.write_at(text, &Local::now())
    }

    /// Write `text` stamped with `created`.
    ///
    /// A file with the same name (same second) is overwritten.
    pub fn write_at(&self, text: &str, created: &DateTime<Local>) -> Result<PathBuf, AuditError> {
        let path = self.path_for(created);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| AuditError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
                debug!("Ensured report directory {}", parent.display());
            }
        }

        fs::write(&path, text).map_err(|source| AuditError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Report written to {} ({} bytes)", path.display(), text.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 13, 4, 5).unwrap()
    }

    #[test]
    fn test_default_path_layout() {
        let path = ReportWriter::default().path_for(&fixed_time());
        assert_eq!(
            path,
            PathBuf::from(
                "docs/agents/dependency-auditor/dependencies-report-2024-05-01-13-04-05.md"
            )
        );
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(
            dir.path().join("docs/agents/dependency-auditor"),
            "dependencies-report",
        );

        let path = writer.write("# Report\n").unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Report\n");

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        let pattern =
            Regex::new(r"^dependencies-report-\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2}\.md$").unwrap();
        assert!(pattern.is_match(&name), "unexpected name {name}");
    }

    #[test]
    fn test_same_second_overwrites() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path(), "report");
        let at = fixed_time();

        let first = writer.write_at("first", &at).unwrap();
        let second = writer.write_at("second", &at).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(second).unwrap(), "second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_directory_is_write_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("docs");
        fs::write(&blocker, "not a directory").unwrap();

        let writer = ReportWriter::new(blocker.join("agents"), "report");
        let result = writer.write("text");
        assert!(matches!(result, Err(AuditError::Write { .. })));
    }
}
