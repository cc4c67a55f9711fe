//! Fetching source documents over HTTP.

use reqwest::Client;
use tracing::info;
use url::Url;

use crate::types::IngestError;

/// Raw document payload retrieved from the source location.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: Url,
    pub bytes: Vec<u8>,
}

impl FetchedDocument {
    /// Size of the retrieved payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Builds the HTTP client shared by the fetch and embedding adapters.
pub fn http_client() -> Result<Client, IngestError> {
    Client::builder()
        .user_agent(concat!("docloom/", env!("CARGO_PKG_VERSION")))
        .use_rustls_tls()
        .build()
        .map_err(|err| IngestError::Config(format!("failed to build HTTP client: {err}")))
}

/// Retrieves the full byte payload behind `url`.
///
/// A non-2xx status or any transport failure is a transient
/// [`IngestError::FetchFailed`]; the caller decides whether the stage is
/// retried. The payload is returned whole so downstream stages never observe
/// a partial document.
pub async fn fetch_document(client: &Client, url: &Url) -> Result<FetchedDocument, IngestError> {
    let fail = |reason: String| IngestError::FetchFailed {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|err| fail(err.to_string()))?
        .error_for_status()
        .map_err(|err| fail(err.to_string()))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|err| fail(err.to_string()))?
        .to_vec();

    info!(url = %url, bytes = bytes.len(), "fetched document");
    Ok(FetchedDocument {
        url: url.clone(),
        bytes,
    })
}
