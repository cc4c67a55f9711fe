//! Stage sequencing for one document's ingestion run.
//!
//! [`IngestPipeline::run`] drives fetch → parse → (embed → store) per chunk,
//! strictly in chunk-index order, and reports one terminal outcome for the
//! whole document. Each stage runs under its own single-attempt timeout
//! budget; whether a failed stage is retried as a whole is the external
//! execution engine's decision, guided by [`IngestError::is_transient`].
//!
//! The run itself keeps no durable state. Extraction and chunking are pure
//! transforms, embedding is read-only against the provider, and the only
//! external side effect is the store's idempotent upsert, so replaying a
//! run (or resuming it mid-document) converges on the same stored records.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::chunking::WordChunker;
use crate::embeddings::EmbeddingRequester;
use crate::extract::{DocumentFormat, extract_text, paragraphs};
use crate::ingestion::fetch_document;
use crate::stores::{ChunkRecord, VectorStore};
use crate::types::IngestError;

/// One stage of a run, used for timeout mapping and failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Parse,
    Embed(usize),
    Store(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Parse => write!(f, "parse"),
            Stage::Embed(index) => write!(f, "embed[{index}]"),
            Stage::Store(index) => write!(f, "store[{index}]"),
        }
    }
}

/// Per-stage single-attempt budgets, declared for the execution engine.
///
/// Fetch and parse cover a whole document and get the long budgets; embed
/// and store are per chunk and get the short ones.
#[derive(Debug, Clone)]
pub struct StageTimeouts {
    pub fetch: Duration,
    pub parse: Duration,
    pub embed: Duration,
    pub store: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            fetch: Duration::from_secs(300),
            parse: Duration::from_secs(300),
            embed: Duration::from_secs(120),
            store: Duration::from_secs(120),
        }
    }
}

/// Successful terminal outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub file_id: String,
    /// Total chunks produced and stored for the document.
    pub chunk_count: usize,
    pub elapsed: Duration,
}

/// Terminal failure of a run: the document, the stage that failed, and the
/// error that made the failure final.
#[derive(Debug, Error)]
#[error("run {run_id} failed at stage {stage}: {error}")]
pub struct RunFailure {
    pub run_id: String,
    pub file_id: String,
    pub stage: Stage,
    pub error: IngestError,
}

fn fail(run_id: &str, file_id: &str, stage: Stage, error: IngestError) -> RunFailure {
    RunFailure {
        run_id: run_id.to_string(),
        file_id: file_id.to_string(),
        stage,
        error,
    }
}

/// Sequences one document's ingestion end to end.
pub struct IngestPipeline {
    client: reqwest::Client,
    chunker: WordChunker,
    embedder: EmbeddingRequester,
    store: Arc<dyn VectorStore>,
    timeouts: StageTimeouts,
}

impl IngestPipeline {
    pub fn new(
        client: reqwest::Client,
        embedder: EmbeddingRequester,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            client,
            chunker: WordChunker::default(),
            embedder,
            store,
            timeouts: StageTimeouts::default(),
        }
    }

    #[must_use]
    pub fn with_chunker(mut self, chunker: WordChunker) -> Self {
        self.chunker = chunker;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Runs the whole pipeline for one document.
    ///
    /// The run identity is derived from `file_id`, so re-triggering the same
    /// document targets the same logical run. An empty document (no
    /// paragraphs after extraction) completes successfully with zero chunks
    /// and no store calls.
    pub async fn run(&self, file_id: &str, source_url: &Url) -> Result<RunReport, RunFailure> {
        let run_id = format!("ingest-{file_id}");
        let started = Instant::now();
        info!(%run_id, url = %source_url, "starting ingestion run");

        let fetched = self
            .bounded(Stage::Fetch, self.timeouts.fetch, fetch_document(&self.client, source_url))
            .await
            .map_err(|err| fail(&run_id, file_id, Stage::Fetch, err))?;

        let format = DocumentFormat::from_url(source_url);
        let text = self
            .bounded(Stage::Parse, self.timeouts.parse, extract_text(&fetched.bytes, format))
            .await
            .map_err(|err| fail(&run_id, file_id, Stage::Parse, err))?;

        let lines = paragraphs(&text);
        let chunks = self.chunker.chunk(lines.iter().copied());
        info!(
            %run_id,
            format = format.label(),
            paragraphs = lines.len(),
            chunks = chunks.len(),
            "parsed document"
        );

        for chunk in &chunks {
            let stage = Stage::Embed(chunk.index);
            let vector = self
                .bounded(stage, self.timeouts.embed, self.embedder.embed(&chunk.text))
                .await
                .map_err(|err| fail(&run_id, file_id, stage, err))?;

            let record = ChunkRecord::new(file_id, chunk.index, chunk.text.clone(), vector);
            let stage = Stage::Store(chunk.index);
            self.bounded(stage, self.timeouts.store, self.store.upsert_chunk(&record))
                .await
                .map_err(|err| fail(&run_id, file_id, stage, err))?;
            debug!(%run_id, chunk_index = chunk.index, "stored chunk");
        }

        let report = RunReport {
            run_id,
            file_id: file_id.to_string(),
            chunk_count: chunks.len(),
            elapsed: started.elapsed(),
        };
        info!(
            run_id = %report.run_id,
            chunks = report.chunk_count,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "ingestion run completed"
        );
        Ok(report)
    }

    /// Runs one stage under its timeout budget.
    ///
    /// An elapsed budget maps to the transient [`IngestError::StageTimeout`];
    /// errors the stage produced itself pass through untouched, so permanent
    /// format errors stay permanent.
    async fn bounded<T>(
        &self,
        stage: Stage,
        budget: Duration,
        work: impl Future<Output = Result<T, IngestError>>,
    ) -> Result<T, IngestError> {
        match tokio::time::timeout(budget, work).await {
            Ok(result) => result,
            Err(_) => Err(IngestError::StageTimeout {
                stage: stage.to_string(),
                budget,
            }),
        }
    }
}
