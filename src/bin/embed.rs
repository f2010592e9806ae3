use std::path::PathBuf;

use clap::Parser;
use llmbatch::{
    agent::{openai_client, EmbeddingAgent},
    config::{DispatchConfig, FailurePolicy, Strategy},
    format::Formatter,
    loader::{chunk_documents, load_documents},
    pipeline,
    storage::LocalSaver
};
use tokio::time::Instant;

/// Chunk text files and embed the chunks in bounded-concurrency batches.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Text files to chunk and embed
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// windowed or gated
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Characters per chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Chunks per embeddings request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Cap on in-flight requests
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// fail-fast or best-effort
    #[arg(long)]
    failure_policy: Option<FailurePolicy>,

    /// Embedding model identifier
    #[arg(long)]
    model: Option<String>,

    /// Write embeddings as JSONL
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let start = Instant::now();
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = DispatchConfig::from_env()?;
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(n) = args.chunk_size {
        config.chunk_size = n;
    }
    if let Some(n) = args.batch_size {
        config.batch_size = n;
    }
    if let Some(n) = args.max_concurrency {
        config.max_concurrency = n;
    }
    if let Some(policy) = args.failure_policy {
        config.failure_policy = policy;
    }
    if let Some(model) = args.model {
        config.embedding_model = model;
    }
    config.validate()?;

    let documents = load_documents(&args.files)?;
    let chunks = chunk_documents(&documents, config.chunk_size)?;
    println!("Total number of chunks: {}", chunks.len());

    let agent = EmbeddingAgent::from_config(openai_client(), &config);
    let report = pipeline::run(agent, &config, chunks).await?;
    println!("Total embeddings: {}", report.results.len() - report.failures());
    if report.failures() > 0 {
        println!("Failed chunks: {}", report.failures());
    }

    if let Some(path) = args.output {
        LocalSaver::save_results_as_jsonl(&path, report.run_id, &report.items, &report.results)?;
        tracing::info!("embeddings written to {}", path.display());
    }

    println!("{}", Formatter::to_elapsed(start.elapsed()));
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
