//! Shared error taxonomy for the ingestion pipeline.
//!
//! Every stage reports failures through [`IngestError`]. The distinction that
//! matters to callers is *transient vs permanent*: transient errors are safe
//! for the external execution engine to retry as a whole stage, permanent
//! errors abort the run. [`IngestError::is_transient`] encodes that table.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the ingestion pipeline and its collaborator adapters.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The document bytes could not be retrieved (network failure or
    /// non-2xx status). Transient.
    #[error("fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// The source locator's extension is not one of the recognized document
    /// formats. Permanent.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The document decoder rejected the payload. Permanent.
    #[error("document could not be decoded: {0}")]
    CorruptDocument(String),

    /// The embedding provider failed on every attempt of the internal retry
    /// loop. Permanent once surfaced; retries are already exhausted.
    #[error("embedding failed after {attempts} attempts: {reason}")]
    EmbeddingFailed { attempts: usize, reason: String },

    /// The vector store could not be reached or the write did not complete.
    /// Transient.
    #[error("vector store unavailable: {0}")]
    StoreUnavailable(String),

    /// The vector store refused the record (malformed identity or payload).
    /// Permanent.
    #[error("vector store rejected record {record_id}: {reason}")]
    StoreRejected { record_id: String, reason: String },

    /// The store handle was constructed but its backing extension never came
    /// up. Fails fast rather than operating on a half-initialized handle.
    #[error("vector store not initialized: {0}")]
    StoreNotInitialized(String),

    /// A stage exceeded its single-attempt budget. Treated like a transient
    /// failure of that stage.
    #[error("stage {stage} timed out after {budget:?}")]
    StageTimeout { stage: String, budget: Duration },

    /// Required configuration is missing or unparseable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Whether the external execution engine may retry the failed stage.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IngestError::FetchFailed { .. }
                | IngestError::StoreUnavailable(_)
                | IngestError::StageTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transience_classification() {
        assert!(
            IngestError::FetchFailed {
                url: "https://example.com/a.pdf".into(),
                reason: "503".into()
            }
            .is_transient()
        );
        assert!(IngestError::StoreUnavailable("locked".into()).is_transient());
        assert!(
            IngestError::StageTimeout {
                stage: "store[0]".into(),
                budget: Duration::from_secs(120)
            }
            .is_transient()
        );

        assert!(!IngestError::UnsupportedFormat("png".into()).is_transient());
        assert!(!IngestError::CorruptDocument("truncated".into()).is_transient());
        assert!(
            !IngestError::EmbeddingFailed {
                attempts: 3,
                reason: "overloaded".into()
            }
            .is_transient()
        );
        assert!(
            !IngestError::StoreRejected {
                record_id: "f::0".into(),
                reason: "empty embedding".into()
            }
            .is_transient()
        );
    }
}
