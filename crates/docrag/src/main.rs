//! # docrag CLI
//!
//! Ask natural-language questions about a private document collection.
//!
//! docrag extracts text from documents and images (images are read by a
//! vision model), splits it into overlapping chunks, embeds them into a
//! persisted vector index and answers questions with a language model
//! grounded on the retrieved chunks.
//!
//! ## Commands
//!
//! - `docrag index` - Rebuild the index from the data directory
//! - `docrag ask <QUESTION>` - Answer a question (builds the index if needed)
//! - `docrag status` - Show index statistics
//! - `docrag config show|init|path` - Inspect configuration
//!
//! ## Examples
//!
//! ```bash
//! # Index ./data
//! docrag index
//!
//! # Ask, showing which chunks were used
//! docrag ask "Which invoice is the oldest?" --sources
//!
//! # Get JSON output
//! docrag ask "What is the capital of France?" --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docrag_core::{Embedder, LanguageModel, QueryResult};
use docrag_embed::OllamaEmbedder;
use docrag_extract::{ExtractorRegistry, ImageExtractor, OllamaVision, TextExtractor};
use docrag_index::{RagService, ReindexReport, ServiceStatus};
use docrag_query::OllamaGenerator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "docrag")]
#[command(about = "Retrieval-augmented question answering over your documents")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/docrag/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory to index (overrides the config file)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the data directory
    Index,

    /// Answer a question from the indexed documents
    Ask {
        /// Question to answer
        question: String,

        /// Also show the chunks the answer was based on
        #[arg(short, long)]
        sources: bool,
    },

    /// Show index status
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Wire the Ollama-backed capabilities into a service.
fn create_service(config: &Config) -> Result<RagService> {
    let models = &config.models;

    let embedder: Arc<dyn Embedder> = Arc::new(
        OllamaEmbedder::new(&models.base_url, &models.embedding, models.timeout())
            .context("Failed to create embedding client")?,
    );
    let llm: Arc<dyn LanguageModel> = Arc::new(
        OllamaGenerator::new(&models.base_url, &models.llm, models.timeout())
            .context("Failed to create language model client")?,
    );
    let vision = Arc::new(
        OllamaVision::new(&models.base_url, &models.vision, models.timeout())
            .context("Failed to create vision model client")?,
    );

    let mut extractors = ExtractorRegistry::new();
    extractors.register(TextExtractor::new());
    extractors.register(ImageExtractor::new(vision));

    info!(
        "Using {} (embedding), {} (answers), {} (vision) at {}",
        models.embedding, models.llm, models.vision, models.base_url
    );

    RagService::new(config.service_config(), extractors, embedder, llm)
        .context("Invalid service configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from(cli.config.clone()).context("Failed to load config")?;
    if let Some(dir) = cli.data_dir.clone() {
        config.corpus.data_dir = dir;
    }

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Index => {
            let service = create_service(&config)?;
            let report = service.reindex().await.context("Indexing failed")?;
            print_reindex(&report, cli.format)?;
        }

        Commands::Ask { question, sources } => {
            let service = create_service(&config)?;
            service
                .ensure_index()
                .await
                .context("Failed to load or build the index")?;

            let result = if sources {
                service.query_with_sources(&question).await
            } else {
                service.query(&question).await
            }
            .context("Query failed")?;

            print_answer(&result, cli.format)?;
        }

        Commands::Status => {
            let service = create_service(&config)?;
            service.load().await.context("Failed to read index")?;
            print_status(&service.status().await, cli.format)?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

fn print_reindex(report: &ReindexReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            println!(
                "Indexed {} chunks from {} documents ({} text, {} images)",
                report.chunk_count,
                report.text_documents + report.image_documents,
                report.text_documents,
                report.image_documents
            );
            println!("  Text:   {}", report.text_chunks);
            println!("  Images: {}", report.image_chunks);
            if !report.failed_files.is_empty() {
                println!("Skipped {} files:", report.failed_files.len());
                for failure in &report.failed_files {
                    println!("  {}: {}", failure.source, failure.reason);
                }
            }
        }
    }
    Ok(())
}

fn print_answer(result: &QueryResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            println!("{}", result.answer.trim());
            if !result.sources.is_empty() {
                println!("\nSources:");
                for (i, source) in result.sources.iter().enumerate() {
                    println!("{}. {}", i + 1, source);
                }
            }
            if !result.context.is_empty() {
                println!("\nContext:");
                for passage in result.context.split("\n\n") {
                    println!("   {}", truncate(passage, 100));
                }
            }
        }
    }
    Ok(())
}

fn print_status(status: &ServiceStatus, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(status)?),
        OutputFormat::Text => match &status.index {
            Some(stats) => {
                println!("Index Status for {}", status.index_dir.display());
                println!("  Chunks:    {}", stats.chunk_count);
                println!("  Text:      {}", stats.text_chunks);
                println!("  Images:    {}", stats.image_chunks);
                println!("  Model:     {} ({} dimensions)", stats.model, stats.dimension);
                println!("  Built:     {}", stats.built_at.format("%Y-%m-%d %H:%M:%S"));
            }
            None => {
                println!("No usable index at {}", status.index_dir.display());
                println!("Run 'docrag index' to build it from {}.", status.data_dir.display());
            }
        },
    }
    Ok(())
}

/// Truncate a string to max length in characters, adding ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ").replace('\r', "");
    if s.chars().count() <= max_len {
        s
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_sources() {
        let cli = Cli::try_parse_from(["docrag", "ask", "What is it?", "--sources", "-f", "json"])
            .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        match cli.command {
            Commands::Ask { question, sources } => {
                assert_eq!(question, "What is it?");
                assert!(sources);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_parse_data_dir_override() {
        let cli = Cli::try_parse_from(["docrag", "--data-dir", "/srv/docs", "index"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/docs")));
        assert!(matches!(cli.command, Commands::Index));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 100), "line one line two");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }
}
