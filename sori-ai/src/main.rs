//! sori-ai - journal affect estimation CLI
//!
//! Runs the entry pipeline and the knowledge tools from the command line.
//! Every command prints JSON on stdout; logs go to stderr (or the configured
//! log file).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use sori_ai::config::{build_extractor, build_indexer, build_pipeline, knowledge_documents, ServiceClients};
use sori_ai::knowledge::{collect_files, load_documents, Retriever};
use sori_ai::models::UserSession;
use sori_ai::types::VoiceAnalysis;
use sori_ai::voice::{BaselineTracker, DimensionMapper};
use sori_ai::workflow::{Submission, SubmissionOutcome};
use sori_common::config::{resolve_root_folder, TomlConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Command-line arguments for sori-ai
#[derive(Parser, Debug)]
#[command(name = "sori-ai")]
#[command(about = "Voice and text journal affect estimation")]
#[command(version)]
struct Args {
    /// Configuration file (default: SORI_CONFIG, then <config_dir>/sori/sori-ai.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root folder holding the knowledge/ directory
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one journal entry and print the entry record
    Analyze {
        /// Entry text; may be omitted when audio is given
        #[arg(short, long, default_value = "")]
        text: String,

        /// Recording of the entry
        #[arg(short, long)]
        audio: Option<PathBuf>,

        /// Reference documents in addition to the configured ones
        #[arg(short, long)]
        knowledge: Vec<PathBuf>,
    },

    /// Print raw features and cold-start voice cues for a recording
    Features {
        audio: PathBuf,
    },

    /// Build a knowledge index and print its size and content hash
    Index {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Search reference documents
    Search {
        #[arg(short, long)]
        query: String,

        /// Number of matches (default: [knowledge] top_k)
        #[arg(long)]
        top_k: Option<usize>,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    sori_common::logging::init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!("Starting sori-ai v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Analyze { text, audio, knowledge } => {
            let root = resolve_root_folder(args.root_folder.as_deref(), &config);
            analyze(&config, &root, text, audio.as_deref(), &knowledge).await
        }
        Command::Features { audio } => features(&config, &audio).await,
        Command::Index { paths } => index(&config, &paths),
        Command::Search { query, top_k, paths } => search(&config, &query, top_k, &paths),
    }
}

async fn analyze(
    config: &TomlConfig,
    root: &Path,
    text: String,
    audio: Option<&Path>,
    extra_knowledge: &[PathBuf],
) -> Result<()> {
    let audio = match audio {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };
    if text.trim().is_empty() && audio.is_none() {
        anyhow::bail!("Provide --text, --audio, or both");
    }

    let clients = ServiceClients::from_config(config)?;
    let pipeline = build_pipeline(config, clients);

    let mut session = UserSession::new();
    let mut document_paths = knowledge_documents(root, config);
    document_paths.extend(expand_paths(extra_knowledge));
    if !document_paths.is_empty() {
        let documents = load_documents(&document_paths);
        let index = session.rebuild_knowledge(&build_indexer(config), &documents);
        info!(documents = documents.len(), chunks = index.len(), "Knowledge index ready");
    }

    let submission = Submission { text, audio };
    match pipeline.submit(&mut session, submission).await {
        SubmissionOutcome::Recorded(entry) => print_json(&entry),
        SubmissionOutcome::NothingToAnalyze { voice } => print_json(&json!({
            "status": "nothing_to_analyze",
            "message": "No text was provided and the recording could not be transcribed",
            "voice": voice,
        })),
    }
}

async fn features(config: &TomlConfig, path: &Path) -> Result<()> {
    let audio = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let extractor = build_extractor(config);
    let features = tokio::task::spawn_blocking(move || extractor.extract(&audio))
        .await
        .context("Feature extraction task failed")?;

    let mut baseline = BaselineTracker::default();
    baseline.update(&features);
    let cues = DimensionMapper::default().map(&features, &baseline);

    print_json(&VoiceAnalysis { features, cues })
}

fn index(config: &TomlConfig, paths: &[PathBuf]) -> Result<()> {
    let documents = load_documents(&expand_paths(paths));
    let index = build_indexer(config).build(&documents);

    print_json(&json!({
        "documents": documents.len(),
        "chunks": index.len(),
        "signature": index.scheme().kind(),
        "content_hash": index.content_hash(),
    }))
}

fn search(config: &TomlConfig, query: &str, top_k: Option<usize>, paths: &[PathBuf]) -> Result<()> {
    let documents = load_documents(&expand_paths(paths));
    let index = build_indexer(config).build(&documents);
    let retriever = Retriever::new(top_k.unwrap_or(config.knowledge.top_k));

    print_json(&retriever.search(query, &index))
}

/// Files named on the command line, directories expanded recursively
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        match collect_files(path) {
            Ok(found) => files.extend(found),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping knowledge path"),
        }
    }
    files
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
