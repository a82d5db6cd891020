//! Configuration file handling.
//!
//! This module handles loading `.dependency-auditor.toml`, merging CLI
//! overrides into it, and resolving the API key from the environment.

use crate::agent::{ClientConfig, Pricing};
use crate::error::AuditError;
use crate::prompt::{DEFAULT_PLACEHOLDER, DEFAULT_SYSTEM_PROMPT};
use crate::report::{DEFAULT_FILE_PREFIX, DEFAULT_OUTPUT_DIR};
use crate::scanner::{DEFAULT_EXCLUDES, DEFAULT_PATTERNS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".dependency-auditor.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Per-thousand-token rates for the cost estimate.
    #[serde(default)]
    pub pricing: Pricing,

    /// Manifest discovery settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Prompt template settings.
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Show a spinner while waiting for the model.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier sent with the request.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature; the service default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// System message sent before the prompt. An empty string disables it.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: None,
            max_tokens: None,
            timeout_seconds: default_timeout(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    600
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl ModelConfig {
    /// The system message, if one is configured.
    pub fn system_message(&self) -> Option<String> {
        let trimmed = self.system_prompt.trim();
        (!trimmed.is_empty()).then(|| self.system_prompt.clone())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            model_name: self.name.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_seconds: self.timeout_seconds,
        }
    }

    /// Read the API key from the process environment.
    pub fn resolve_api_key(&self) -> Result<String, AuditError> {
        self.resolve_api_key_with(|var| std::env::var(var).ok())
    }

    /// Resolve the API key through `lookup`; unset or blank is an error.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String, AuditError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(&self.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(AuditError::MissingCredential {
                var: self.api_key_env.clone(),
            }),
        }
    }
}

/// Manifest discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Directory to scan.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns for manifest files.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,

    /// Directory names that are never descended into.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            patterns: default_patterns(),
            excludes: default_excludes(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|e| e.to_string()).collect()
}

/// Prompt template settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Path of the template file.
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Slot name, written `{name}` in the template.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_template() -> PathBuf {
    PathBuf::from("agent/prompt.md")
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory receiving the reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name prefix before the timestamp.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line (or through their env fallbacks)
    /// override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref base_url) = args.base_url {
            self.model.base_url = base_url.clone();
        }
        if let Some(ref var) = args.api_key_env {
            self.model.api_key_env = var.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = Some(temperature);
        }

        if let Some(ref root) = args.root {
            self.scanner.root = root.clone();
        }
        if let Some(ref patterns) = args.patterns {
            self.scanner.patterns = patterns.clone();
        }
        if let Some(ref excludes) = args.exclude {
            self.scanner.excludes = excludes.clone();
        }

        if let Some(ref template) = args.template {
            self.prompt.template = template.clone();
        }
        if let Some(ref output_dir) = args.output_dir {
            self.report.output_dir = output_dir.clone();
        }

        // Quiet always wins over the file
        if args.quiet {
            self.general.show_progress = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
