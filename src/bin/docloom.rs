//! Command-line trigger: exactly one ingestion run per invocation.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use docloom::config::IngestConfig;
use docloom::embeddings::{CohereEmbedder, EmbeddingRequester};
use docloom::ingestion::http_client;
use docloom::pipeline::IngestPipeline;
use docloom::stores::SqliteChunkStore;

/// Ingest one remote document into the vector store.
#[derive(Debug, Parser)]
#[command(name = "docloom", version, about)]
struct Args {
    /// Caller-assigned unique id for the document.
    #[arg(long)]
    file_id: String,

    /// URL of the document to ingest.
    #[arg(long)]
    file_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse();
    let config = IngestConfig::from_env()?;
    let source_url = Url::parse(&args.file_url)?;

    let client = http_client()?;
    let provider = CohereEmbedder::new(&config.cohere_api_key, config.embed_model.clone())?;
    let embedder = EmbeddingRequester::new(Arc::new(provider));
    let store = Arc::new(SqliteChunkStore::open(&config.db_path).await?);

    let pipeline = IngestPipeline::new(client, embedder, store).with_timeouts(config.timeouts);

    match pipeline.run(&args.file_id, &source_url).await {
        Ok(report) => {
            println!(
                "{} completed: {} chunks stored in {:.1?}",
                report.run_id, report.chunk_count, report.elapsed
            );
            Ok(())
        }
        Err(failure) => {
            eprintln!("{failure}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
