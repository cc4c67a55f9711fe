//! SQLite-backed vector store using the `sqlite-vec` extension.

use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, OptionalExtension, ffi};
use tracing::info;

use super::{ChunkRecord, VectorStore};
use crate::types::IngestError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chunks (
    id          TEXT PRIMARY KEY,
    file_id     TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    content     TEXT NOT NULL,
    embedding   BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS chunks_by_file ON chunks(file_id);
";

/// Row shape shared by the read queries.
type RecordParts = (String, String, i64, String, Vec<u8>);

/// Chunk store persisted in a single SQLite database file.
///
/// The handle is constructed once at process startup and injected into the
/// pipeline; there is no ambient global. Opening registers the sqlite-vec
/// extension process-wide and probes it, so a handle that silently lacks
/// vector support cannot exist: the probe failure surfaces as
/// [`IngestError::StoreNotInitialized`] instead.
#[derive(Clone)]
pub struct SqliteChunkStore {
    conn: Connection,
}

impl SqliteChunkStore {
    /// Opens (or creates) the store at `path` and prepares its schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        register_sqlite_vec()?;

        let conn = Connection::open(path)
            .await
            .map_err(|err| IngestError::StoreUnavailable(err.to_string()))?;

        let vec_version = conn
            .call(|conn| {
                conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
                    .map_err(tokio_rusqlite::Error::from)
            })
            .await
            .map_err(|err| {
                IngestError::StoreNotInitialized(format!("sqlite-vec probe failed: {err}"))
            })?;

        conn.call(|conn| conn.execute_batch(SCHEMA).map_err(tokio_rusqlite::Error::from))
            .await
            .map_err(|err| IngestError::StoreUnavailable(err.to_string()))?;

        info!(%vec_version, "opened chunk store");
        Ok(Self { conn })
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|value| value.to_le_bytes()).collect()
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|lane| f32::from_le_bytes([lane[0], lane[1], lane[2], lane[3]]))
        .collect()
}

fn record_from_parts((id, file_id, chunk_index, content, blob): RecordParts) -> ChunkRecord {
    ChunkRecord {
        record_id: id,
        file_id,
        chunk_index: chunk_index as usize,
        text: content,
        embedding: blob_to_embedding(&blob),
    }
}

/// Registers sqlite-vec as an auto extension, once per process.
///
/// Every connection opened afterwards sees the `vec_*` SQL functions.
fn register_sqlite_vec() -> Result<(), IngestError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| unsafe {
            type ExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init = std::mem::transmute::<unsafe extern "C" fn(), ExtensionInit>(
                sqlite_vec::sqlite3_vec_init as unsafe extern "C" fn(),
            );
            let rc = ffi::sqlite3_auto_extension(Some(init));
            if rc == ffi::SQLITE_OK {
                Ok(())
            } else {
                Err(format!("sqlite3_auto_extension returned {rc}"))
            }
        })
        .clone()
        .map_err(IngestError::StoreNotInitialized)
}

#[async_trait]
impl VectorStore for SqliteChunkStore {
    async fn upsert_chunk(&self, record: &ChunkRecord) -> Result<(), IngestError> {
        if record.record_id.is_empty() || record.file_id.is_empty() {
            return Err(IngestError::StoreRejected {
                record_id: record.record_id.clone(),
                reason: "empty record identity".into(),
            });
        }
        if record.embedding.is_empty() {
            return Err(IngestError::StoreRejected {
                record_id: record.record_id.clone(),
                reason: "empty embedding".into(),
            });
        }

        let id = record.record_id.clone();
        let file_id = record.file_id.clone();
        let chunk_index = record.chunk_index as i64;
        let content = record.text.clone();
        let blob = embedding_to_blob(&record.embedding);

        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<()> {
                conn.execute(
                    "INSERT INTO chunks (id, file_id, chunk_index, content, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(id) DO UPDATE SET
                         file_id = excluded.file_id,
                         chunk_index = excluded.chunk_index,
                         content = excluded.content,
                         embedding = excluded.embedding",
                    (id, file_id, chunk_index, content, blob),
                )
                .map_err(tokio_rusqlite::Error::from)?;
                Ok(())
            })
            .await
            .map_err(|err| IngestError::StoreUnavailable(err.to_string()))
    }

    async fn get_chunk(&self, record_id: &str) -> Result<Option<ChunkRecord>, IngestError> {
        let record_id = record_id.to_string();
        let parts: Option<RecordParts> = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, file_id, chunk_index, content, embedding
                     FROM chunks WHERE id = ?1",
                    [record_id],
                    |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                    },
                )
                .optional()
                .map_err(tokio_rusqlite::Error::from)
            })
            .await
            .map_err(|err| IngestError::StoreUnavailable(err.to_string()))?;

        Ok(parts.map(record_from_parts))
    }

    async fn count_for_file(&self, file_id: &str) -> Result<usize, IngestError> {
        let file_id = file_id.to_string();
        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<usize> {
                let count: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM chunks WHERE file_id = ?1",
                        [file_id],
                        |row| row.get(0),
                    )
                    .map_err(tokio_rusqlite::Error::from)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| IngestError::StoreUnavailable(err.to_string()))
    }

    async fn search_similar(
        &self,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>, IngestError> {
        let query_json = serde_json::to_string(query)
            .map_err(|err| IngestError::StoreUnavailable(err.to_string()))?;
        let limit = top_k as i64;

        let rows: Vec<(RecordParts, f32)> = self
            .conn
            .call(move |conn| -> tokio_rusqlite::Result<Vec<(RecordParts, f32)>> {
                let mut statement = conn
                    .prepare(
                        "SELECT id, file_id, chunk_index, content, embedding,
                                vec_distance_cosine(embedding, vec_f32(?1)) AS distance
                         FROM chunks
                         ORDER BY distance ASC
                         LIMIT ?2",
                    )
                    .map_err(tokio_rusqlite::Error::from)?;

                let mapped = statement
                    .query_map((query_json, limit), |row| {
                        let parts =
                            (row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?);
                        let distance: f32 = row.get(5)?;
                        Ok((parts, distance))
                    })
                    .map_err(tokio_rusqlite::Error::from)?;

                let mut results = Vec::new();
                for row in mapped {
                    results.push(row.map_err(tokio_rusqlite::Error::from)?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| IngestError::StoreUnavailable(err.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(parts, distance)| (record_from_parts(parts), 1.0 - distance))
            .collect())
    }
}
