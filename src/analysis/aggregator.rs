//! Manifest content aggregation.
//!
//! Reads every discovered manifest and concatenates the contents, each
//! preceded by a `--- File: <path> ---` separator line.

use crate::error::AuditError;
use crate::models::{AggregatedContent, ManifestFile};
use crate::scanner::DiscoveredManifest;
use std::fs;
use tracing::debug;

/// Read all manifests, failing on the first unreadable one.
///
/// Any unreadable file (gone since discovery, or not UTF-8) aborts the
/// whole read; nothing partial is returned.
pub fn read_manifests(discovered: &[DiscoveredManifest]) -> Result<Vec<ManifestFile>, AuditError> {
    discovered
        .iter()
        .map(|manifest| -> Result<ManifestFile, AuditError> {
            let content =
                fs::read_to_string(&manifest.absolute).map_err(|source| AuditError::Read {
                    path: manifest.absolute.clone(),
                    source,
                })?;
            debug!("Read {} ({} bytes)", manifest.path, content.len());
            Ok(ManifestFile::new(manifest.path.clone(), content))
        })
        .collect()
}

/// Concatenate manifests in the order given.
pub fn aggregate(files: &[ManifestFile]) -> AggregatedContent {
    let mut content = AggregatedContent::default();
    for file in files {
        content.push(file);
    }
    content
}

/// Read and aggregate in one step.
pub fn aggregate_discovered(
    discovered: &[DiscoveredManifest],
) -> Result<AggregatedContent, AuditError> {
    let files = read_manifests(discovered)?;
    Ok(aggregate(&files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn discovered(root: &Path, rel: &str) -> DiscoveredManifest {
        DiscoveredManifest {
            path: rel.to_string(),
            absolute: root.join(rel),
            size: 0,
        }
    }

    #[test]
    fn test_aggregate_empty() {
        let content = aggregate(&[]);
        assert_eq!(content.file_count(), 0);
        assert_eq!(content.as_str(), "");
    }

    #[test]
    fn test_each_file_appears_once_after_its_label() {
        let files = vec![
            ManifestFile::new("requirements.txt", "flask==2.0\n"),
            ManifestFile::new("web/package.json", r#"{"react":"18.0"}"#),
            ManifestFile::new("go.mod", "module x\n"),
        ];

        let content = aggregate(&files);
        let text = content.as_str();
        assert_eq!(content.file_count(), 3);

        for file in &files {
            let block = format!("{}{}", file.label(), file.content);
            assert_eq!(text.matches(&block).count(), 1, "block for {}", file.path);
        }

        // discovery order is preserved
        let first = text.find("requirements.txt").unwrap();
        let second = text.find("web/package.json").unwrap();
        let third = text.find("go.mod").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_aggregate_exact_layout() {
        let files = vec![
            ManifestFile::new("a/go.mod", "module a"),
            ManifestFile::new("pom.xml", "<project/>"),
        ];
        assert_eq!(
            aggregate(&files).as_str(),
            "\n--- File: a/go.mod ---\nmodule a\n--- File: pom.xml ---\n<project/>"
        );
    }

    #[test]
    fn test_read_manifests_from_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "flask==2.0").unwrap();

        let files = read_manifests(&[discovered(dir.path(), "requirements.txt")]).unwrap();
        assert_eq!(files, vec![ManifestFile::new("requirements.txt", "flask==2.0")]);
    }

    #[test]
    fn test_vanished_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        let list = vec![
            discovered(dir.path(), "package.json"),
            discovered(dir.path(), "go.mod"),
        ];

        let err = aggregate_discovered(&list).unwrap_err();
        match err {
            AuditError::Read { path, .. } => assert!(path.ends_with("go.mod")),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn test_binary_content_is_read_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pom.xml"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let result = read_manifests(&[discovered(dir.path(), "pom.xml")]);
        assert!(matches!(result, Err(AuditError::Read { .. })));
    }
}
