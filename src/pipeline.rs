//! The audit pipeline.
//!
//! Collect → aggregate → render → invoke → write, each stage running to
//! completion before the next. Any error aborts the run before the report
//! is written.

use crate::agent::{ChatModel, OpenAiChatClient, Pricing, UsageMetrics};
use crate::analysis::aggregate_discovered;
use crate::config::Config;
use crate::error::AuditError;
use crate::models::{AggregatedContent, CompletionRequest};
use crate::prompt::PromptTemplate;
use crate::report::ReportWriter;
use crate::scanner::{DiscoveredManifest, ManifestCollector, ScanConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// How a run ended when nothing failed.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    /// No manifest matched; nothing was sent or written.
    NoManifests,
    /// The model answered and the report was saved.
    Written {
        path: PathBuf,
        manifests: usize,
        usage: UsageMetrics,
    },
}

/// Everything computed before the model is called.
#[derive(Debug, Clone)]
pub struct PreparedAudit {
    pub manifests: Vec<DiscoveredManifest>,
    pub content: AggregatedContent,
    pub prompt: String,
}

/// Collect, aggregate and render. `Ok(None)` when no manifest was found.
pub fn prepare_audit(
    collector: &ManifestCollector,
    template: &PromptTemplate,
) -> Result<Option<PreparedAudit>, AuditError> {
    let manifests = collector.collect()?;
    if manifests.is_empty() {
        warn!(
            "No dependency manifests found under {}; nothing to audit",
            collector.root().display()
        );
        return Ok(None);
    }

    for manifest in &manifests {
        info!("Found manifest: {}", manifest.path);
    }

    let content = aggregate_discovered(&manifests)?;
    let prompt = template.render(content.as_str())?;

    Ok(Some(PreparedAudit {
        manifests,
        content,
        prompt,
    }))
}

/// One configured audit run.
pub struct AuditPipeline<M> {
    collector: ManifestCollector,
    template: PromptTemplate,
    model: M,
    system_prompt: Option<String>,
    pricing: Pricing,
    writer: ReportWriter,
    show_progress: bool,
}

impl<M: ChatModel> AuditPipeline<M> {
    pub fn new(
        collector: ManifestCollector,
        template: PromptTemplate,
        model: M,
        writer: ReportWriter,
    ) -> Self {
        Self {
            collector,
            template,
            model,
            system_prompt: None,
            pricing: Pricing::default(),
            writer,
            show_progress: false,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    #[cfg(test)]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run the whole audit.
    pub async fn run(&self) -> Result<AuditOutcome, AuditError> {
        let prepared = match prepare_audit(&self.collector, &self.template)? {
            Some(prepared) => prepared,
            None => return Ok(AuditOutcome::NoManifests),
        };

        info!(
            "Sending {} manifest(s) to {} ({} prompt bytes)",
            prepared.manifests.len(),
            self.model.model_name(),
            prepared.prompt.len()
        );

        let request = CompletionRequest {
            system: self.system_prompt.clone(),
            user: prepared.prompt,
        };

        let spinner = self.spinner();
        let result = self.model.complete(&request).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        let completion = result?;

        let usage = UsageMetrics::new(completion.usage, &self.pricing);
        usage.log();

        let path = self.writer.write(&completion.text)?;
        info!("Audit complete");

        Ok(AuditOutcome::Written {
            path,
            manifests: prepared.manifests.len(),
            usage,
        })
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Waiting for {}...", self.model.model_name()));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

impl AuditPipeline<OpenAiChatClient> {
    /// Build the production pipeline from merged configuration.
    ///
    /// The API key is resolved first, so a missing credential fails before
    /// any file is touched.
    pub fn from_config(config: &Config) -> Result<Self, AuditError> {
        let api_key = config.model.resolve_api_key()?;
        Self::from_config_with_key(config, api_key)
    }

    pub fn from_config_with_key(config: &Config, api_key: String) -> Result<Self, AuditError> {
        let template = PromptTemplate::load(&config.prompt.template, &config.prompt.placeholder)?;
        let collector = ManifestCollector::new(ScanConfig::from(&config.scanner))?;
        let client = OpenAiChatClient::new(config.model.client_config(), api_key)?;
        let writer = ReportWriter::new(
            config.report.output_dir.clone(),
            config.report.file_prefix.clone(),
        );

        Ok(Self::new(collector, template, client, writer)
            .with_system_prompt(config.model.system_message())
            .with_pricing(config.pricing)
            .with_progress(config.general.show_progress))
    }
}
