use crate::config::IngestLimits;
use crate::core::sheet_ml;
use crate::domain::model::{RawCell, RawRow};
use crate::utils::error::{IngestError, Result};
use calamine::{Data, Reader, Xls, Xlsx};
use std::io::Cursor;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Decodes untrusted workbook bytes into a grid of [`RawRow`]s.
///
/// The container format is sniffed from leading bytes rather than trusted
/// from the file name: PALMS hands out zip-based `.xlsx`, OLE2 binary `.xls`,
/// and XML SpreadsheetML files that are also named `.xls`. Decoding runs in a
/// reduced-feature mode: no date coercion (date cells surface as their raw
/// serial number), no number-format reinterpretation, no rich-text expansion.
/// Every decoder-level failure is rewrapped as a typed error; nothing panics
/// across this boundary.
pub struct WorkbookParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Xlsx,
    XlsBinary,
    SpreadsheetMl,
}

impl WorkbookParser {
    pub fn parse(bytes: &[u8], limits: &IngestLimits) -> Result<Vec<RawRow>> {
        let container = sniff_container(bytes)?;
        tracing::debug!("Detected workbook container: {:?}", container);

        let rows = match container {
            Container::Xlsx => {
                let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
                    .map_err(|e| IngestError::MalformedWorkbook(e.to_string()))?;
                rows_via_calamine(workbook, limits)?
            }
            Container::XlsBinary => {
                let workbook: Xls<_> = Xls::new(Cursor::new(bytes))
                    .map_err(|e| IngestError::MalformedWorkbook(e.to_string()))?;
                rows_via_calamine(workbook, limits)?
            }
            Container::SpreadsheetMl => sheet_ml::parse(bytes, limits)?,
        };

        tracing::debug!("Decoded {} data rows from first worksheet", rows.len());
        Ok(rows)
    }
}

fn sniff_container(bytes: &[u8]) -> Result<Container> {
    if bytes.starts_with(&ZIP_MAGIC) {
        return Ok(Container::Xlsx);
    }
    if bytes.starts_with(&OLE2_MAGIC) {
        return Ok(Container::XlsBinary);
    }

    // PALMS audit exports are SpreadsheetML: XML documents with a .xls name.
    let head = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
    let trimmed = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| &head[start..])
        .unwrap_or(&[]);
    if trimmed.starts_with(b"<?xml") || trimmed.starts_with(b"<Workbook") {
        return Ok(Container::SpreadsheetMl);
    }

    Err(IngestError::MalformedWorkbook(
        "unrecognized spreadsheet container".to_string(),
    ))
}

fn rows_via_calamine<RS, R>(mut workbook: R, limits: &IngestLimits) -> Result<Vec<RawRow>>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_count = workbook.sheet_names().len();
    if sheet_count == 0 {
        return Err(IngestError::NoSheetsFound);
    }
    if sheet_count > limits.max_sheets {
        return Err(IngestError::TooManySheets {
            count: sheet_count,
            limit: limits.max_sheets,
        });
    }

    // First sheet by index, deterministically, never by name.
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::NoSheetsFound)?
        .map_err(|e| IngestError::MalformedWorkbook(e.to_string()))?;

    // A sparse sheet can declare cells far from the origin; check the decoded
    // dimensions before materializing a grid of that size.
    let data_rows = range.height().saturating_sub(1);
    if data_rows > limits.max_rows {
        return Err(IngestError::TooManyRows {
            count: data_rows,
            limit: limits.max_rows,
        });
    }
    if range.width() > limits.max_columns {
        return Err(IngestError::TooManyColumns {
            row: 0,
            count: range.width(),
            limit: limits.max_columns,
        });
    }

    let grid: Vec<Vec<RawCell>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_raw).collect())
        .collect();

    grid_to_rows(grid)
}

fn cell_to_raw(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Missing,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        // Raw serial number, deliberately not coerced into a date.
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(_) => RawCell::Null,
    }
}

/// Turns a rectangular-ish cell grid into header-keyed rows: row 1 supplies
/// the headers (blank header cells get synthetic `Column_{i}` names, the way
/// the PALMS exports are padded), every later row maps header -> cell with
/// absent cells recorded as `RawCell::Missing`.
pub(crate) fn grid_to_rows(mut grid: Vec<Vec<RawCell>>) -> Result<Vec<RawRow>> {
    let width = grid.iter().map(|row| row.len()).max().unwrap_or(0);
    if grid.is_empty() || width == 0 {
        return Err(IngestError::UnreadableWorksheet);
    }

    let header_cells = grid.remove(0);
    let headers: Vec<String> = (0..width)
        .map(|i| header_label(header_cells.get(i), i))
        .collect();

    let rows = grid
        .into_iter()
        .map(|mut cells| {
            cells.resize(width, RawCell::Missing);
            RawRow::from_pairs(headers.iter().cloned().zip(cells))
        })
        .collect();

    Ok(rows)
}

fn header_label(cell: Option<&RawCell>, index: usize) -> String {
    match cell {
        Some(RawCell::Text(t)) if !t.trim().is_empty() => t.clone(),
        Some(RawCell::Number(n)) => n.to_string(),
        Some(RawCell::Bool(b)) => b.to_string(),
        _ => format!("Column_{index}"),
    }
}
