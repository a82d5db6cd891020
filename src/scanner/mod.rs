//! Manifest discovery.
//!
//! Walks the scan root and returns every file whose root-relative path
//! matches one of the configured glob patterns.

use crate::error::AuditError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Manifest patterns searched when nothing else is configured.
pub const DEFAULT_PATTERNS: [&str; 4] = [
    "**/package.json",
    "**/requirements.txt",
    "**/pom.xml",
    "**/go.mod",
];

/// Directory names never descended into by default.
pub const DEFAULT_EXCLUDES: [&str; 5] = ["node_modules", "target", "vendor", "venv", "__pycache__"];

/// Configuration for manifest discovery.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory the walk starts from.
    pub root: PathBuf,
    /// Glob patterns matched against root-relative paths.
    pub patterns: Vec<String>,
    /// Directory names to skip entirely.
    pub excludes: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            excludes: DEFAULT_EXCLUDES.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            root: config.root.clone(),
            patterns: config.patterns.clone(),
            excludes: config.excludes.clone(),
        }
    }
}

/// A compiled glob pattern.
///
/// `**/` matches zero or more directories, `*` any run of characters inside
/// one path segment and `?` exactly one such character.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, AuditError> {
        if pattern.trim().is_empty() {
            return Err(AuditError::Config("empty manifest pattern".to_string()));
        }

        let regex = Regex::new(&glob_to_regex(pattern)).map_err(|e| {
            AuditError::Config(format!("invalid manifest pattern '{}': {}", pattern, e))
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Test a `/`-separated path relative to the scan root.
    pub fn matches(&self, relative_path: &str) -> bool {
        self.regex.is_match(relative_path)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:[^/]*/)*");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            c => {
                out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
                i += 1;
            }
        }
    }

    out.push('$');
    out
}

/// A manifest found on disk, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredManifest {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,
    /// Path usable for opening the file.
    pub absolute: PathBuf,
    /// File size in bytes at discovery time.
    pub size: u64,
}

/// Walks the scan root looking for dependency manifests.
pub struct ManifestCollector {
    config: ScanConfig,
    patterns: Vec<GlobPattern>,
}

impl ManifestCollector {
    /// Compile the configured patterns.
    pub fn new(config: ScanConfig) -> Result<Self, AuditError> {
        let patterns = config
            .patterns
            .iter()
            .map(|p| GlobPattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        for pattern in &patterns {
            debug!("Manifest pattern: {}", pattern.as_str());
        }

        Ok(Self { config, patterns })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Return every matching file in sorted walk order.
    ///
    /// An empty result is not an error.
    pub fn collect(&self) -> Result<Vec<DiscoveredManifest>, AuditError> {
        let root = &self.config.root;
        if !root.is_dir() {
            return Err(AuditError::Config(format!(
                "scan root is not a directory: {}",
                root.display()
            )));
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !is_regular_file(&entry) {
                continue;
            }

            let relative = relative_label(root, entry.path());
            if !self.matches(&relative) {
                continue;
            }

            // Follows symlinks, so a linked manifest reports its target's size
            let size = fs::metadata(entry.path()).map(|m| m.len()).unwrap_or(0);
            debug!("Matched manifest: {} ({} bytes)", relative, size);
            found.push(DiscoveredManifest {
                path: relative,
                absolute: entry.into_path(),
                size,
            });
        }

        info!(
            "Discovered {} manifest file(s) under {}",
            found.len(),
            root.display()
        );
        Ok(found)
    }

    /// Check a root-relative path against the patterns.
    pub fn matches(&self, relative_path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(relative_path))
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();

        // Hidden files and directories
        if name.starts_with('.') {
            return true;
        }

        entry.file_type().is_dir() && self.config.excludes.iter().any(|e| *e == name)
    }
}

/// Regular files, plus symlinks that resolve to one.
fn is_regular_file(entry: &DirEntry) -> bool {
    if entry.path_is_symlink() {
        entry.path().is_file()
    } else {
        entry.file_type().is_file()
    }
}

fn relative_label(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
