use std::path::PathBuf;

use clap::Parser;
use llmbatch::{
    agent::{openai_client, SummaryAgent},
    config::{DispatchConfig, FailurePolicy},
    format::Formatter,
    loader::load_documents,
    model::WorkItem,
    pipeline,
    storage::LocalSaver
};
use tokio::time::Instant;

/// Summarize whole text files with a chat model.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Text files to summarize, one request per file
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Summarize one file at a time
    #[arg(long)]
    sequential: bool,

    /// Cap on concurrent requests
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// fail-fast or best-effort
    #[arg(long)]
    failure_policy: Option<FailurePolicy>,

    /// Chat model identifier
    #[arg(long)]
    model: Option<String>,

    /// Write results as JSONL
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
    // one file per request
    config.batch_size = 1;
    if let Some(n) = args.max_concurrency {
        config.max_concurrency = n;
    }
    if args.sequential {
        config.max_concurrency = 1;
    }
    if let Some(policy) = args.failure_policy {
        config.failure_policy = policy;
    }
    if let Some(model) = args.model {
        config.chat_model = model;
    }

    let items = load_documents(&args.files)?
        .into_iter()
        .enumerate()
        .map(|(i, (source, content))| WorkItem::new(i, &source, content))
        .collect::<Vec<_>>();

    let agent = SummaryAgent::from_config(openai_client(), &config);
    let report = pipeline::run(agent, &config, items).await?;
    for (i, result) in report.results.iter().enumerate() {
        println!("{}", Formatter::to_summary_line(i, result));
    }

    if let Some(path) = args.output {
        LocalSaver::save_results_as_jsonl(&path, report.run_id, &report.items, &report.results)?;
        tracing::info!("results written to {}", path.display());
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
