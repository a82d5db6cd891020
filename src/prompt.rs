//! Prompt template loading and rendering.
//!
//! A template is plain text with exactly one `{name}` slot. Rendering is a
//! single substitution; no other text is touched. A slot written with a
//! doubled opening brace, `{{name}}`, is literal text and is left as is.

use crate::error::{AuditError, TemplateError};
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

/// Default slot name, written `{dependencies}` in the template.
pub const DEFAULT_PLACEHOLDER: &str = "dependencies";

/// System message sent alongside the rendered prompt unless overridden.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a software supply-chain auditor. \
You review dependency manifests for outdated, vulnerable, deprecated or \
unmaintained packages and answer in Markdown.";

/// A loaded prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    name: String,
}

impl PromptTemplate {
    /// Load a template from disk.
    pub fn load(path: &Path, placeholder: &str) -> Result<Self, AuditError> {
        let text = std::fs::read_to_string(path).map_err(|source| AuditError::TemplateNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            "Loaded prompt template from {} ({} bytes)",
            path.display(),
            text.len()
        );

        Ok(Self {
            text,
            name: placeholder.to_string(),
        })
    }

    /// Build a template from in-memory text.
    pub fn from_text(text: impl Into<String>, placeholder: &str) -> Self {
        Self {
            text: text.into(),
            name: placeholder.to_string(),
        }
    }

    /// The slot as it must appear in the template, e.g. `{dependencies}`.
    pub fn placeholder(&self) -> String {
        format!("{{{}}}", self.name)
    }

    /// Byte offset of the single well-formed slot.
    ///
    /// Matches preceded by another `{` are escaped examples and are skipped.
    pub fn slot_offset(&self) -> Result<usize, TemplateError> {
        let placeholder = self.placeholder();
        let near_miss = Regex::new(&format!(r"\{{\s*{}\b\s*\}}?", regex::escape(&self.name)))
            .map_err(|_| TemplateError::MalformedPlaceholder {
                placeholder: placeholder.clone(),
                offset: 0,
            })?;

        let mut offsets = Vec::new();
        for found in near_miss.find_iter(&self.text) {
            if self.text[..found.start()].ends_with('{') {
                continue;
            }
            if found.as_str() != placeholder {
                return Err(TemplateError::MalformedPlaceholder {
                    placeholder,
                    offset: found.start(),
                });
            }
            offsets.push(found.start());
        }

        match offsets.as_slice() {
            [offset] => Ok(*offset),
            [] => Err(TemplateError::MissingPlaceholder { placeholder }),
            many => Err(TemplateError::DuplicatePlaceholder {
                placeholder,
                count: many.len(),
            }),
        }
    }

    /// Substitute `content` into the slot.
    pub fn render(&self, content: &str) -> Result<String, TemplateError> {
        let offset = self.slot_offset()?;
        let end = offset + self.placeholder().len();

        let mut rendered = String::with_capacity(self.text.len() + content.len());
        rendered.push_str(&self.text[..offset]);
        rendered.push_str(content);
        rendered.push_str(&self.text[end..]);

        debug!("Rendered prompt: {} bytes", rendered.len());
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEMPLATE: &str = "# Audit\n\nReview these manifests:\n{dependencies}\n\nAnswer in Markdown.";

    #[test]
    fn test_render_replaces_only_the_slot() {
        let template = PromptTemplate::from_text(TEMPLATE, DEFAULT_PLACEHOLDER);
        let content = "\n--- File: go.mod ---\nmodule x";
        let rendered = template.render(content).unwrap();

        assert!(rendered.contains(content));
        assert_eq!(
            rendered,
            "# Audit\n\nReview these manifests:\n\n--- File: go.mod ---\nmodule x\n\nAnswer in Markdown."
        );
    }

    #[test]
    fn test_render_keeps_other_braces() {
        let template = PromptTemplate::from_text(
            "Reply as JSON like {\"ok\": true}.\n{dependencies}\n{{literal}}",
            DEFAULT_PLACEHOLDER,
        );
        let rendered = template.render("X").unwrap();
        assert_eq!(rendered, "Reply as JSON like {\"ok\": true}.\nX\n{{literal}}");
    }

    #[test]
    fn test_content_is_not_re_rendered() {
        let template = PromptTemplate::from_text("before {dependencies} after", DEFAULT_PLACEHOLDER);
        let rendered = template.render("{dependencies}").unwrap();
        assert_eq!(rendered, "before {dependencies} after");
    }

    #[test]
    fn test_empty_content_renders() {
        let template = PromptTemplate::from_text("a{dependencies}b", DEFAULT_PLACEHOLDER);
        assert_eq!(template.render("").unwrap(), "ab");
    }

    #[test]
    fn test_missing_placeholder() {
        let template = PromptTemplate::from_text("no slot here", DEFAULT_PLACEHOLDER);
        assert_eq!(
            template.render("x"),
            Err(TemplateError::MissingPlaceholder {
                placeholder: "{dependencies}".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_placeholder() {
        let template =
            PromptTemplate::from_text("{dependencies} and {dependencies}", DEFAULT_PLACEHOLDER);
        assert!(matches!(
            template.render("x"),
            Err(TemplateError::DuplicatePlaceholder { count: 2, .. })
        ));
    }

    #[test]
    fn test_doubled_braces_are_literal() {
        let template = PromptTemplate::from_text(
            "Example: {{dependencies}}\n{dependencies}",
            DEFAULT_PLACEHOLDER,
        );
        assert_eq!(template.slot_offset(), Ok(26));
        assert_eq!(template.render("X").unwrap(), "Example: {{dependencies}}\nX");

        let only_literal = PromptTemplate::from_text("{{dependencies}}", DEFAULT_PLACEHOLDER);
        assert!(matches!(
            only_literal.render("X"),
            Err(TemplateError::MissingPlaceholder { .. })
        ));
    }

    #[test]
    fn test_malformed_placeholders() {
        for text in ["list: {dependencies", "list: { dependencies }", "list: {dependencies }"] {
            let template = PromptTemplate::from_text(text, DEFAULT_PLACEHOLDER);
            assert_eq!(
                template.render("x"),
                Err(TemplateError::MalformedPlaceholder {
                    placeholder: "{dependencies}".to_string(),
                    offset: 6,
                }),
                "template {text:?}"
            );
        }
    }

    #[test]
    fn test_longer_names_are_not_the_slot() {
        let template = PromptTemplate::from_text(
            "{dependencies_count} items: {dependencies}",
            DEFAULT_PLACEHOLDER,
        );
        assert_eq!(template.render("x").unwrap(), "{dependencies_count} items: x");
    }

    #[test]
    fn test_custom_placeholder_name() {
        let template = PromptTemplate::from_text("<<{manifests}>>", "manifests");
        assert_eq!(template.placeholder(), "{manifests}");
        assert_eq!(template.render("m").unwrap(), "<<m>>");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = PromptTemplate::load(&dir.path().join("prompt.md"), DEFAULT_PLACEHOLDER);
        let err = result.unwrap_err();
        assert!(matches!(err, AuditError::TemplateNotFound { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prompt.md");
        std::fs::write(&path, TEMPLATE).unwrap();

        let template = PromptTemplate::load(&path, DEFAULT_PLACEHOLDER).unwrap();
        assert_eq!(
            template.render("X").unwrap(),
            TEMPLATE.replace("{dependencies}", "X")
        );
    }

    #[test]
    fn test_shipped_template_renders() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("agent/prompt.md");
        let template = PromptTemplate::load(&path, DEFAULT_PLACEHOLDER).unwrap();
        assert!(template.render("x").is_ok());
    }
}
