//! Format-aware text extraction.
//!
//! A document's format is a pure function of its source locator: the
//! lowercase filename extension of the URL path selects one
//! [`DocumentFormat`] variant, and each variant has exactly one extraction
//! function. The mapping is exhaustive; an unrecognized extension is a
//! permanent [`IngestError::UnsupportedFormat`] before any decoding runs.
//!
//! Extraction output is normalized by [`paragraphs`]: non-empty,
//! whitespace-trimmed lines, with blank lines discarded entirely.

mod docx;
mod legacy;
mod pdf;
mod sheet;

use url::Url;

use crate::types::IngestError;

/// Document format tag derived from the source locator's path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    /// Legacy binary Word format, handled by an external converter.
    Doc,
    /// Excel workbooks, both `.xls` and `.xlsx`.
    Spreadsheet,
    Unsupported,
}

impl DocumentFormat {
    /// Derives the format tag from the lowercase extension of the URL path.
    ///
    /// Only the path component is consulted; query strings and fragments
    /// never influence the tag.
    pub fn from_url(url: &Url) -> Self {
        let path = url.path();
        let name = path.rsplit('/').next().unwrap_or(path);
        let Some((_, extension)) = name.rsplit_once('.') else {
            return Self::Unsupported;
        };
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "doc" => Self::Doc,
            "xls" | "xlsx" => Self::Spreadsheet,
            _ => Self::Unsupported,
        }
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Spreadsheet => "xls/xlsx",
            Self::Unsupported => "unknown",
        }
    }
}

/// Converts raw document bytes into one normalized text stream.
///
/// Decode failures are permanent [`IngestError::CorruptDocument`] errors;
/// an [`DocumentFormat::Unsupported`] tag is a permanent
/// [`IngestError::UnsupportedFormat`].
pub async fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, IngestError> {
    match format {
        DocumentFormat::Pdf => pdf::extract(bytes),
        DocumentFormat::Docx => docx::extract(bytes),
        DocumentFormat::Doc => legacy::extract(bytes).await,
        DocumentFormat::Spreadsheet => sheet::extract(bytes),
        DocumentFormat::Unsupported => Err(IngestError::UnsupportedFormat(
            "no recognized filename extension on the source URL".into(),
        )),
    }
}

/// Splits extracted text into non-empty, whitespace-trimmed paragraph lines.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_of(url: &str) -> DocumentFormat {
        DocumentFormat::from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn format_tag_follows_path_extension() {
        assert_eq!(format_of("https://example.com/a/report.pdf"), DocumentFormat::Pdf);
        assert_eq!(format_of("https://example.com/minutes.docx"), DocumentFormat::Docx);
        assert_eq!(format_of("https://example.com/legacy.doc"), DocumentFormat::Doc);
        assert_eq!(format_of("https://example.com/budget.xls"), DocumentFormat::Spreadsheet);
        assert_eq!(format_of("https://example.com/budget.xlsx"), DocumentFormat::Spreadsheet);
    }

    #[test]
    fn format_tag_is_case_insensitive() {
        assert_eq!(format_of("https://example.com/REPORT.PDF"), DocumentFormat::Pdf);
        assert_eq!(format_of("https://example.com/Budget.XlSx"), DocumentFormat::Spreadsheet);
    }

    #[test]
    fn query_string_does_not_affect_the_tag() {
        assert_eq!(
            format_of("https://example.com/report.pdf?download=1&session=png"),
            DocumentFormat::Pdf
        );
    }

    #[test]
    fn unrecognized_extensions_are_unsupported() {
        assert_eq!(format_of("https://example.com/image.png"), DocumentFormat::Unsupported);
        assert_eq!(format_of("https://example.com/archive.tar.gz"), DocumentFormat::Unsupported);
        assert_eq!(format_of("https://example.com/no-extension"), DocumentFormat::Unsupported);
        assert_eq!(format_of("https://example.com/"), DocumentFormat::Unsupported);
    }

    #[tokio::test]
    async fn unsupported_format_never_reaches_a_decoder() {
        let err = extract_text(b"\x89PNG\r\n", DocumentFormat::Unsupported)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn paragraphs_drop_blank_lines_and_trim() {
        let text = "  first paragraph \n\n\tsecond\n   \nthird\n";
        assert_eq!(paragraphs(text), vec!["first paragraph", "second", "third"]);
    }

    #[test]
    fn empty_text_yields_no_paragraphs() {
        assert!(paragraphs("").is_empty());
        assert!(paragraphs("\n \n\t\n").is_empty());
    }
}
