//! Text extraction from WordprocessingML (`.docx`) payloads.
//!
//! A docx file is a zip archive whose main document part is
//! `word/document.xml`. Paragraph text lives in `<w:t>` runs nested inside
//! `<w:p>` elements; runs are concatenated in document order and each
//! paragraph becomes one logical line.

use std::fmt::Display;
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::types::IngestError;

fn corrupt(err: impl Display) -> IngestError {
    IngestError::CorruptDocument(format!("docx: {err}"))
}

pub fn extract(bytes: &[u8]) -> Result<String, IngestError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(corrupt)?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(corrupt)?
        .read_to_string(&mut xml)
        .map_err(corrupt)?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event().map_err(corrupt)? {
            Event::Start(ref element) if element.name().as_ref() == b"w:t" => {
                in_text_run = true;
            }
            Event::Text(content) if in_text_run => {
                text.push_str(&content.unescape().map_err(corrupt)?);
            }
            Event::Empty(ref element) => match element.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Event::End(ref element) => match element.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn docx_bytes(body_xml: &str) -> Vec<u8> {
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body_xml}</w:body></w:document>"
        );
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_become_lines_in_document_order() {
        let bytes = docx_bytes(
            "<w:p><w:r><w:t>first paragraph</w:t></w:r></w:p>\
             <w:p><w:r><w:t>second</w:t></w:r><w:r><w:t> paragraph</w:t></w:r></w:p>",
        );
        let text = extract(&bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["first paragraph", "second paragraph"]);
    }

    #[test]
    fn structural_markup_outside_runs_is_ignored() {
        let bytes = docx_bytes(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr>\
             <w:r><w:t>heading text</w:t></w:r></w:p>",
        );
        assert_eq!(extract(&bytes).unwrap().trim(), "heading text");
    }

    #[test]
    fn empty_body_extracts_to_no_text() {
        let bytes = docx_bytes("");
        assert!(extract(&bytes).unwrap().trim().is_empty());
    }

    #[test]
    fn missing_document_part_is_corrupt() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("unrelated.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hello").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract(&bytes).unwrap_err();
        assert!(matches!(err, IngestError::CorruptDocument(_)));
    }

    #[test]
    fn non_zip_payload_is_corrupt() {
        let err = extract(b"plain bytes").unwrap_err();
        assert!(matches!(err, IngestError::CorruptDocument(_)));
    }
}
