mod display;
#[cfg(feature = "similarity")]
mod embed;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lawgate_agents::Orchestrator;
use lawgate_ai::{ChatCompletionClient, TextCompletion};
use lawgate_core::{AnalysisConfig, Feature, ReferenceDocument};
use lawgate_store::{ResultCache, RetrievalService, Retriever, load_corpus};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "lawgate", version, about = "Geo-regulatory compliance screening for product features")]
struct Cli {
    /// JSON file overriding analysis defaults.
    #[arg(long, env = "LAWGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Reference corpus (JSON array or `{"documents": [...]}`).
    #[arg(long, env = "LAWGATE_CORPUS", global = true, default_value = "data/corpus.json")]
    corpus: PathBuf,

    /// Result cache file.
    #[arg(long, env = "LAWGATE_CACHE", global = true, default_value = "data/cache.json")]
    cache: PathBuf,

    /// Completion API key; without one the Legal Analyst uses its local rule.
    #[arg(long, env = "LAWGATE_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// LanceDB directory for the similarity index.
    #[cfg(feature = "similarity")]
    #[arg(long, env = "LAWGATE_INDEX", global = true, default_value = "data/lancedb")]
    index_dir: PathBuf,

    /// ONNX sentence-transformers model directory.
    #[cfg(feature = "similarity")]
    #[arg(long, env = "LAWGATE_MODEL", global = true, default_value = "models/all-MiniLM-L6-v2")]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse one feature and print its verdict.
    Analyze {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// Source file attached to the feature as implementation context.
        #[arg(long)]
        code: Option<PathBuf>,
        #[arg(long)]
        id: Option<String>,
        /// Print the verdict as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Analyse every feature in a JSON file.
    Batch {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show what the Legal Analyst would retrieve for a query.
    Search {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Embed the corpus into the LanceDB similarity index.
    #[cfg(feature = "similarity")]
    Index,
    /// Inspect or prune the result cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Drop expired entries.
    Purge,
    /// Entry count and TTL.
    Stats,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureFile {
    Wrapped { features: Vec<Feature> },
    List(Vec<Feature>),
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    match path {
        Some(p) => AnalysisConfig::from_path(p).with_context(|| format!("loading config {}", p.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_features(path: &Path) -> anyhow::Result<Vec<Feature>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: FeatureFile =
        serde_json::from_str(&raw).with_context(|| format!("parsing features from {}", path.display()))?;
    Ok(match file {
        FeatureFile::Wrapped { features } | FeatureFile::List(features) => features,
    })
}

/// A missing corpus file means an empty corpus; a malformed one is an error.
fn load_documents(path: &Path) -> anyhow::Result<Vec<ReferenceDocument>> {
    if !path.exists() {
        warn!(path = %path.display(), "corpus file not found, continuing with an empty corpus");
        return Ok(Vec::new());
    }
    load_corpus(path).with_context(|| format!("loading corpus {}", path.display()))
}

async fn build_retrieval(cli: &Cli, documents: Vec<ReferenceDocument>) -> RetrievalService {
    #[cfg(feature = "similarity")]
    match embed::OnnxQueryEmbedder::load(&cli.model_dir) {
        Ok(embedder) => {
            return RetrievalService::similarity(documents, &cli.index_dir, Arc::new(embedder)).await;
        }
        Err(e) => warn!(error = %e, "embedding model unavailable, using keyword retrieval"),
    }
    #[cfg(not(feature = "similarity"))]
    let _ = cli;
    RetrievalService::keyword(documents)
}

fn build_completion(
    cli: &Cli,
    config: &AnalysisConfig,
) -> anyhow::Result<Option<Arc<dyn TextCompletion>>> {
    let Some(key) = cli.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        info!("no API key configured, legal analysis uses the local relevance rule");
        return Ok(None);
    };
    let client: Arc<dyn TextCompletion> = Arc::new(
        ChatCompletionClient::from_config(config, key).context("building completion client")?,
    );
    Ok(Some(client))
}

async fn build_orchestrator(cli: &Cli, config: &AnalysisConfig) -> anyhow::Result<Orchestrator> {
    let documents = load_documents(&cli.corpus)?;
    let retrieval = build_retrieval(cli, documents).await;
    info!(documents = retrieval.len(), mode = %retrieval.mode(), "retrieval ready");

    let cache = ResultCache::open(&cli.cache, config.cache_ttl())
        .with_context(|| format!("opening cache {}", cli.cache.display()))?;
    let completion = build_completion(cli, config)?;

    Ok(Orchestrator::standard(
        config,
        Arc::new(retrieval),
        Arc::new(cache),
        completion,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Analyze {
            name,
            description,
            code,
            id,
            json,
        } => {
            let mut feature = Feature::new(name, description);
            if let Some(id) = id {
                feature = feature.with_id(id);
            }
            if let Some(path) = code {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                feature = feature.with_code(source);
            }

            let orchestrator = build_orchestrator(&cli, &config).await?;
            let verdict = orchestrator.analyze_feature(feature).await;
            if *json {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            } else {
                display::print_verdict_card(&verdict);
            }
        }
        Command::Batch { file, json } => {
            let features = load_features(file)?;
            let orchestrator = build_orchestrator(&cli, &config).await?;
            let verdicts = orchestrator.analyze_batch(features).await;
            if *json {
                println!("{}", serde_json::to_string_pretty(&verdicts)?);
            } else {
                for verdict in &verdicts {
                    display::print_verdict_card(verdict);
                }
                display::print_batch_summary(&verdicts);
            }
        }
        Command::Search { query, limit } => {
            let documents = load_documents(&cli.corpus)?;
            let retrieval = build_retrieval(&cli, documents).await;
            let results = retrieval.search(query, *limit).await;
            display::print_search_results(retrieval.mode(), query, &results);
        }
        #[cfg(feature = "similarity")]
        Command::Index => {
            let documents = load_documents(&cli.corpus)?;
            let stats = embed::run_index(&documents, &cli.index_dir, &cli.model_dir).await?;
            eprintln!(
                "Indexed {} documents in {:.1}s ({})",
                stats.rows,
                stats.elapsed_secs,
                cli.index_dir.display()
            );
        }
        Command::Cache { action } => {
            let cache = ResultCache::open(&cli.cache, config.cache_ttl())
                .with_context(|| format!("opening cache {}", cli.cache.display()))?;
            match action {
                CacheAction::Purge => {
                    let removed = cache.purge_expired()?;
                    println!("Removed {removed} expired entries, {} remaining", cache.len());
                }
                CacheAction::Stats => {
                    println!("  {:<26} {}", "path", cli.cache.display());
                    println!("  {:<26} {}", "entries", cache.len());
                    println!("  {:<26} {} days", "ttl", cache.ttl().num_days());
                }
            }
        }
    }
    Ok(())
}
