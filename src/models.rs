//! Data models shared by the pipeline stages.
//!
//! Everything here lives for a single run only; nothing is persisted except
//! the report text itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dependency manifest read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,
    /// Full UTF-8 content of the file.
    pub content: String,
}

impl ManifestFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Separator line that precedes this file's content in the aggregate.
    pub fn label(&self) -> String {
        format!("\n--- File: {} ---\n", self.path)
    }
}

/// All manifest contents concatenated in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedContent {
    text: String,
    file_count: usize,
}

impl AggregatedContent {
    /// Append one manifest, label first.
    pub fn push(&mut self, file: &ManifestFile) {
        self.text.push_str(&file.label());
        self.text.push_str(&file.content);
        self.file_count += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }
}

impl fmt::Display for AggregatedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Token counters as reported by the model service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

/// What gets sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Optional system message describing the assistant's role.
    pub system: Option<String>,
    /// The rendered prompt.
    pub user: String,
}

/// What the model sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_format() {
        let file = ManifestFile::new("api/go.mod", "module api");
        assert_eq!(file.label(), "\n--- File: api/go.mod ---\n");
    }

    #[test]
    fn test_aggregated_content_push() {
        let mut content = AggregatedContent::default();
        assert_eq!(content.file_count(), 0);

        content.push(&ManifestFile::new("requirements.txt", "flask==2.0"));
        assert_eq!(content.file_count(), 1);
        assert_eq!(
            content.as_str(),
            "\n--- File: requirements.txt ---\nflask==2.0"
        );
    }

    #[test]
    fn test_token_usage_defaults_missing_fields() {
        let usage: TokenUsage = serde_json::from_str(r#"{"prompt_tokens": 12}"#).unwrap();
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 0);
    }
}
