//! docloom: a durable document-ingestion pipeline.
//!
//! ```text
//! source URL ──► ingestion::fetch_document ──► raw bytes
//!                                                 │
//! bytes + format tag ──► extract::extract_text ──► normalized text
//!                                                 │
//! paragraphs ──► chunking::WordChunker ──► ordered chunks [0, N)
//!                                                 │
//! chunk text ──► embeddings::EmbeddingRequester ──► vector
//!                                                 │
//! (chunk, vector) ──► stores::VectorStore ──► durable records
//! ```
//!
//! [`pipeline::IngestPipeline`] sequences the stages for one document and
//! is the only component aware of the full run; everything else is a pure
//! transform or a single-record side effect. Crash recovery and
//! whole-stage retries belong to the external execution engine that
//! invokes runs; the pipeline's contribution to that contract is
//! determinism (chunk indices are a pure function of the document) and
//! idempotence (stores are keyed upserts), so replaying any prefix of a
//! run converges on the same durable state.

pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod ingestion;
pub mod pipeline;
pub mod stores;
pub mod types;

pub use chunking::{Chunk, WordChunker};
pub use embeddings::{
    CohereEmbedder, EmbeddingProvider, EmbeddingRequester, MockEmbeddingProvider, ProviderError,
    Sleeper,
};
pub use extract::{DocumentFormat, extract_text, paragraphs};
pub use ingestion::{FetchedDocument, fetch_document, http_client};
pub use pipeline::{IngestPipeline, RunFailure, RunReport, Stage, StageTimeouts};
pub use stores::{ChunkRecord, SqliteChunkStore, VectorStore};
pub use types::IngestError;
