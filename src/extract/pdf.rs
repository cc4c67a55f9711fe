//! PDF text extraction, page by page.

use lopdf::Document;

use crate::types::IngestError;

/// Extracts text from every page, concatenated in page order.
///
/// Pages with no extractable text contribute nothing rather than failing
/// the document; only a payload that cannot be loaded at all is corrupt.
pub fn extract(bytes: &[u8]) -> Result<String, IngestError> {
    let document = Document::load_mem(bytes)
        .map_err(|err| IngestError::CorruptDocument(format!("pdf: {err}")))?;

    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        if let Ok(page_text) = document.extract_text(&[*page_number]) {
            text.push_str(&page_text);
        }
    }
    Ok(text)
}
