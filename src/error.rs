//! Error types for the audit pipeline.
//!
//! Every stage returns [`AuditError`]. An empty discovery result is not an
//! error; it surfaces as [`crate::pipeline::AuditOutcome::NoManifests`].

use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort an audit run.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The prompt template file could not be loaded.
    #[error("prompt template not found at {}", path.display())]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The environment variable holding the API key is unset or empty.
    #[error("environment variable {var} is not set; it must hold the model service API key")]
    MissingCredential { var: String },

    /// Any other invalid setting (bad glob pattern, bad URL, ...).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A discovered manifest could not be read as UTF-8 text.
    #[error("failed to read manifest {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The service refused the credential (HTTP 401/403).
    #[error("model service rejected the API key ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// Network failure, timeout, non-success status, or unusable response body.
    #[error("model service error: {0}")]
    Service(String),

    /// The report could not be persisted.
    #[error("failed to write report {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AuditError {
    /// True for errors caused by local setup rather than the run's inputs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AuditError::TemplateNotFound { .. }
                | AuditError::MissingCredential { .. }
                | AuditError::Config(_)
        )
    }
}

/// Problems with the placeholder in a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("prompt template has no {placeholder} placeholder")]
    MissingPlaceholder { placeholder: String },

    #[error("prompt template contains {placeholder} {count} times; exactly one is required")]
    DuplicatePlaceholder { placeholder: String, count: usize },

    #[error("malformed placeholder near byte {offset} in prompt template (expected {placeholder})")]
    MalformedPlaceholder { placeholder: String, offset: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        let missing = AuditError::MissingCredential {
            var: "OPENAI_API_KEY".to_string(),
        };
        assert!(missing.is_configuration());
        assert!(missing.to_string().contains("OPENAI_API_KEY"));

        let service = AuditError::Service("boom".to_string());
        assert!(!service.is_configuration());
    }

    #[test]
    fn test_template_error_is_transparent() {
        let err: AuditError = TemplateError::MissingPlaceholder {
            placeholder: "{dependencies}".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "prompt template has no {dependencies} placeholder"
        );
    }
}
