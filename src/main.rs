//! dependency-auditor - LLM-powered dependency manifest review
//!
//! Collects dependency manifests from a source tree, renders them into a
//! prompt template, asks a chat-completion model for an audit and saves the
//! answer as a timestamped Markdown report.
//!
//! Exit codes:
//!   0 - Report written, or no manifests found (warning only)
//!   1 - Any error (configuration, credential, read, template, service, write)

mod agent;
mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod pipeline;
mod prompt;
mod report;
mod scanner;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use error::AuditError;
use pipeline::{AuditOutcome, AuditPipeline};
use prompt::PromptTemplate;
use scanner::{ManifestCollector, ScanConfig};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("dependency-auditor v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_audit(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Audit failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            if e
                .downcast_ref::<AuditError>()
                .is_some_and(AuditError::is_configuration)
            {
                eprintln!(
                    "   Check {} or the command-line options (see --help).",
                    CONFIG_FILE_NAME
                );
            }
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .dependency-auditor.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, pricing, patterns and output directory.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG`, when set, takes precedence over `-v`/`-q`.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the configured action: dry run or full audit.
async fn run_audit(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.dry_run {
        return handle_dry_run(&config);
    }

    let pipeline = AuditPipeline::from_config(&config)?;

    println!("🔎 Auditing dependency manifests");
    println!("   Root: {}", config.scanner.root.display());
    println!("   Model: {}", config.model.name);
    println!("   Template: {}", config.prompt.template.display());

    match pipeline.run().await? {
        AuditOutcome::NoManifests => {
            println!("\n⚠️  No dependency manifests found. No report written.");
        }
        AuditOutcome::Written {
            path,
            manifests,
            usage,
        } => {
            println!("\n📊 Manifests audited: {}", manifests);
            println!("   Usage: {}", usage);
            println!("\n✅ Report saved to {}", path.display());
        }
    }

    Ok(())
}

/// Handle --dry-run: collect and render, print what would be sent, exit.
fn handle_dry_run(config: &Config) -> Result<()> {
    println!("\n🔍 Dry run: collecting manifests (no model call)...\n");

    let template = PromptTemplate::load(&config.prompt.template, &config.prompt.placeholder)?;
    let collector = ManifestCollector::new(ScanConfig::from(&config.scanner))?;

    match pipeline::prepare_audit(&collector, &template)? {
        None => println!("   No dependency manifests found."),
        Some(prepared) => {
            println!("   Found {} manifest(s):\n", prepared.manifests.len());
            for manifest in &prepared.manifests {
                println!("     📄 {} ({} bytes)", manifest.path, manifest.size);
            }
            println!(
                "\n   Aggregated content: {} bytes",
                prepared.content.as_str().len()
            );
            println!(
                "   Rendered prompt: {} bytes, system message: {}",
                prepared.prompt.len(),
                if config.model.system_message().is_some() {
                    "yes"
                } else {
                    "no"
                }
            );
            debug!("Rendered prompt:\n{}", prepared.prompt);
        }
    }

    println!("\n✅ Dry run complete. No model calls were made.");
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
