//! Durable storage for chunk embeddings.
//!
//! The [`VectorStore`] trait is the single side-effecting seam of the
//! pipeline. Its upsert contract is what makes runs replay-safe: every
//! record is addressed by a deterministic composite key, writing the same
//! content twice is observationally a no-op, and writing different content
//! under the same key overwrites (last write wins, no merge). A write
//! either fully succeeds or has no observable effect.
//!
//! [`sqlite::SqliteChunkStore`] is the shipped backend, built on
//! tokio-rusqlite with the sqlite-vec extension for similarity queries.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::IngestError;

pub use sqlite::SqliteChunkStore;

/// A chunk with its embedding, addressed by a deterministic composite key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// `"{file_id}::{chunk_index}"`: the record's durable identity.
    pub record_id: String,
    pub file_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    /// Builds a record, deriving the composite `record_id`.
    pub fn new(
        file_id: impl Into<String>,
        chunk_index: usize,
        text: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        let file_id = file_id.into();
        Self {
            record_id: format!("{file_id}::{chunk_index}"),
            file_id,
            chunk_index,
            text: text.into(),
            embedding,
        }
    }
}

/// Upsert-by-key storage for chunk embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotently upserts one record under its `record_id`.
    ///
    /// Transient unavailability is [`IngestError::StoreUnavailable`]; a
    /// malformed record is rejected permanently with
    /// [`IngestError::StoreRejected`].
    async fn upsert_chunk(&self, record: &ChunkRecord) -> Result<(), IngestError>;

    /// Fetches one record by its composite key.
    async fn get_chunk(&self, record_id: &str) -> Result<Option<ChunkRecord>, IngestError>;

    /// Number of records stored for one document.
    async fn count_for_file(&self, file_id: &str) -> Result<usize, IngestError>;

    /// Records closest to `query` by cosine distance, most similar first.
    async fn search_similar(
        &self,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>, IngestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_the_composite_key() {
        let record = ChunkRecord::new("doc-7", 3, "some text", vec![0.1]);
        assert_eq!(record.record_id, "doc-7::3");
        assert_eq!(record.file_id, "doc-7");
        assert_eq!(record.chunk_index, 3);
    }
}
