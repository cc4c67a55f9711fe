//! Text extraction from Excel workbooks (`.xls` and `.xlsx`).
//!
//! Every sheet, in the file's sheet order, contributes a delimiter line
//! followed by one line per row of its non-empty cells. Empty cells and
//! all-empty rows are skipped.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::types::IngestError;

const CELL_DELIMITER: &str = " | ";

pub fn extract(bytes: &[u8]) -> Result<String, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| IngestError::CorruptDocument(format!("workbook: {err}")))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_owned() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|err| IngestError::CorruptDocument(format!("sheet '{name}': {err}")))?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        sheets.push((name, rows));
    }

    Ok(render_sheets(&sheets))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Pure rendering over decoded sheets, separated from workbook decoding so
/// the layout contract is testable without authoring workbook files.
pub(crate) fn render_sheets(sheets: &[(String, Vec<Vec<String>>)]) -> String {
    let mut lines = Vec::new();
    for (name, rows) in sheets {
        lines.push(format!("--- Sheet: {name} ---"));
        for row in rows {
            let joined = row
                .iter()
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(CELL_DELIMITER);
            if !joined.is_empty() {
                lines.push(joined);
            }
        }
    }
    lines.join("\n")
}
