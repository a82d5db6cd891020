//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Every option is optional so that values from
//! `.dependency-auditor.toml` survive unless overridden.

use clap::Parser;
use std::path::PathBuf;

/// dependency-auditor - LLM-powered review of dependency manifests
///
/// Collects package.json, requirements.txt, pom.xml and go.mod files,
/// sends them to a chat-completion model with a prompt template and saves
/// the answer under docs/agents/dependency-auditor/.
///
/// Examples:
///   dependency-auditor
///   dependency-auditor --root ./my-project --model gpt-4o
///   dependency-auditor --template prompts/audit.md --dry-run
///   dependency-auditor --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory to scan for manifests
    ///
    /// Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Prompt template file
    ///
    /// Must contain exactly one {dependencies} placeholder. Default: agent/prompt.md
    #[arg(short, long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Model to use for the audit
    #[arg(short, long, env = "DEPENDENCY_AUDITOR_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, value_name = "URL", env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Environment variable that holds the API key
    #[arg(long, value_name = "VAR")]
    pub api_key_env: Option<String>,

    /// Directory the report is written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Manifest glob patterns (comma-separated)
    ///
    /// Example: --patterns "**/package.json,**/Cargo.toml"
    #[arg(long, value_name = "GLOBS", value_delimiter = ',')]
    pub patterns: Option<Vec<String>>,

    /// Directory names to skip (comma-separated)
    ///
    /// Example: --exclude "node_modules,vendor"
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .dependency-auditor.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Temperature for the model (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: collect manifests and render the prompt without calling the model
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .dependency-auditor.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref patterns) = self.patterns {
            if patterns.iter().all(|p| p.trim().is_empty()) {
                return Err("At least one manifest pattern is required".to_string());
            }
        }

        if let Some(ref root) = self.root {
            if !root.exists() {
                return Err(format!("Scan root does not exist: {}", root.display()));
            }
            if !root.is_dir() {
                return Err(format!("Scan root is not a directory: {}", root.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
