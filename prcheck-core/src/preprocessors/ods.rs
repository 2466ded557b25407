//! ODS workbook loader
//!
//! Reads `content.xml` out of an OpenDocument spreadsheet and flattens each
//! `table:table` into a named sheet of text rows. Cell text uses the same
//! recursive concatenation as form fields.

use super::loader::{has_extension, DocumentLoader};
use super::xml::parse_document;
use crate::error::LoadError;
use crate::types::{DocNode, Sheet, Workbook};
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

pub const TABLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";

const CONTENT_ENTRY: &str = "content.xml";

/// Upper bound for `number-columns-repeated` on a non-empty cell
const MAX_COLUMNS: usize = 1024;

#[derive(Default)]
pub struct WorkbookLoader;

impl WorkbookLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for WorkbookLoader {
    type Output = Workbook;

    fn decode_to_markup(&self, bytes: &[u8]) -> Result<String, LoadError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut entry = archive.by_name(CONTENT_ENTRY).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => {
                LoadError::MissingPart(format!("{CONTENT_ENTRY} in spreadsheet"))
            }
            other => LoadError::Archive(other),
        })?;
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| LoadError::Decode(format!("{CONTENT_ENTRY}: {e}")))?;
        Ok(content)
    }

    fn parse_markup(&self, markup: &str) -> Result<Workbook, LoadError> {
        let root = parse_document(markup)?;

        let sheets: Vec<Sheet> = root
            .descendants_ns(TABLE_NS, "table")
            .into_iter()
            .map(read_sheet)
            .collect();
        if sheets.is_empty() {
            return Err(LoadError::WrongFormat(
                "spreadsheet contains no tables".to_string(),
            ));
        }

        debug!(sheets = sheets.len(), "loaded rules workbook");
        Ok(Workbook { sheets })
    }

    fn name(&self) -> &str {
        "OdsWorkbookLoader"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, "ods")
    }
}

fn read_sheet(table: &DocNode) -> Sheet {
    let name = table.attr_ns(TABLE_NS, "name").unwrap_or_default().to_string();
    let rows = table
        .descendants_ns(TABLE_NS, "table-row")
        .into_iter()
        .map(read_row)
        .collect();
    Sheet { name, rows }
}

/// Expand repeated cells; trailing empty cells are dropped
fn read_row(row: &DocNode) -> Vec<String> {
    let mut cells = Vec::new();
    let mut pending_empty = 0usize;

    for cell in row.descendants_ns(TABLE_NS, "table-cell") {
        let repeat = cell
            .attr_ns(TABLE_NS, "number-columns-repeated")
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let text = cell.text();

        if text.is_empty() {
            pending_empty = pending_empty.saturating_add(repeat);
            continue;
        }

        let room = MAX_COLUMNS.saturating_sub(cells.len());
        cells.extend(std::iter::repeat(String::new()).take(pending_empty.min(room)));
        pending_empty = 0;
        let room = MAX_COLUMNS.saturating_sub(cells.len());
        cells.extend(std::iter::repeat(text).take(repeat.min(room)));
    }

    cells
}
