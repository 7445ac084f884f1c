//! SpreadsheetML (XML) workbook decoding.
//!
//! PALMS audit exports are "Excel 2003 XML" documents named `.xls`. Cells can
//! be sparse: a `<Cell ss:Index="4">` jumps to column 4 and the gap must be
//! filled with empty cells. Only the first `<Worksheet>` is materialized;
//! the rest are counted so the sheet ceiling still applies.

use crate::config::IngestLimits;
use crate::core::parser::grid_to_rows;
use crate::domain::model::{RawCell, RawRow};
use crate::utils::error::{IngestError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

pub(crate) fn parse(bytes: &[u8], limits: &IngestLimits) -> Result<Vec<RawRow>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| IngestError::MalformedWorkbook(format!("invalid UTF-8: {e}")))?;

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut state = SheetMlState::new(limits);
    loop {
        match reader.read_event() {
            Err(e) => return Err(IngestError::MalformedWorkbook(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => state.on_start(&e)?,
            Ok(Event::Empty(e)) => state.on_empty(&e)?,
            Ok(Event::End(e)) => state.on_end(e.local_name().as_ref())?,
            Ok(Event::Text(t)) => {
                if state.in_data {
                    let value = t
                        .unescape()
                        .map_err(|e| IngestError::MalformedWorkbook(e.to_string()))?;
                    state.append_text(&value);
                }
            }
            Ok(Event::CData(t)) => {
                if state.in_data {
                    state.append_text(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(_) => {}
        }
    }

    if state.worksheet_count == 0 {
        return Err(IngestError::NoSheetsFound);
    }
    if state.worksheet_count > limits.max_sheets {
        return Err(IngestError::TooManySheets {
            count: state.worksheet_count,
            limit: limits.max_sheets,
        });
    }

    grid_to_rows(state.grid)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataKind {
    Number,
    Boolean,
    Other,
}

#[derive(Debug)]
struct PendingCell {
    /// 1-based column index from `ss:Index`, when the cell is sparse.
    index: Option<usize>,
    kind: DataKind,
    text: Option<String>,
}

struct SheetMlState {
    /// Row and column ceilings are enforced during the event pass itself, so
    /// a tiny document cannot command allocations the ceilings would forbid.
    max_rows: usize,
    max_columns: usize,
    worksheet_count: usize,
    in_first_worksheet: bool,
    grid: Vec<Vec<RawCell>>,
    current_row: Option<Vec<RawCell>>,
    cell: Option<PendingCell>,
    in_data: bool,
}

impl SheetMlState {
    fn new(limits: &IngestLimits) -> Self {
        Self {
            max_rows: limits.max_rows,
            max_columns: limits.max_columns,
            worksheet_count: 0,
            in_first_worksheet: false,
            grid: Vec::new(),
            current_row: None,
            cell: None,
            in_data: false,
        }
    }

    fn on_start(&mut self, e: &BytesStart) -> Result<()> {
        match e.local_name().as_ref() {
            b"Worksheet" => {
                self.worksheet_count += 1;
                self.in_first_worksheet = self.worksheet_count == 1;
            }
            b"Row" if self.in_first_worksheet => {
                self.current_row = Some(Vec::new());
            }
            b"Cell" if self.current_row.is_some() => {
                let index = match attr_value(e, b"Index")? {
                    Some(raw) => Some(raw.trim().parse::<usize>().map_err(|_| {
                        IngestError::MalformedWorkbook(format!("invalid ss:Index '{raw}'"))
                    })?),
                    None => None,
                };
                // The gap fill in finish_cell allocates up to the target
                // column; an attacker-chosen index must not drive that.
                if let Some(target) = index {
                    if target > self.max_columns {
                        return Err(IngestError::TooManyColumns {
                            row: self.grid.len().saturating_sub(1),
                            count: target,
                            limit: self.max_columns,
                        });
                    }
                }
                self.cell = Some(PendingCell {
                    index,
                    kind: DataKind::Other,
                    text: None,
                });
            }
            b"Data" if self.cell.is_some() => {
                self.in_data = true;
                let kind = match attr_value(e, b"Type")?.as_deref() {
                    Some("Number") => DataKind::Number,
                    Some("Boolean") => DataKind::Boolean,
                    _ => DataKind::Other,
                };
                if let Some(cell) = self.cell.as_mut() {
                    cell.kind = kind;
                    cell.text = Some(String::new());
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_empty(&mut self, e: &BytesStart) -> Result<()> {
        // Self-closing elements open and close in one event.
        self.on_start(e)?;
        self.on_end(e.local_name().as_ref())
    }

    fn on_end(&mut self, local_name: &[u8]) -> Result<()> {
        match local_name {
            b"Worksheet" => {
                self.in_first_worksheet = false;
                self.current_row = None;
            }
            b"Row" => {
                if let Some(row) = self.current_row.take() {
                    self.grid.push(row);
                    // Header plus at most max_rows data rows; stop early
                    // instead of materializing an unbounded grid.
                    if self.grid.len() > self.max_rows + 1 {
                        return Err(IngestError::TooManyRows {
                            count: self.grid.len() - 1,
                            limit: self.max_rows,
                        });
                    }
                }
            }
            b"Cell" => self.finish_cell()?,
            b"Data" => self.in_data = false,
            _ => {}
        }
        Ok(())
    }

    fn append_text(&mut self, value: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.text.get_or_insert_with(String::new).push_str(value);
        }
    }

    fn finish_cell(&mut self) -> Result<()> {
        let Some(cell) = self.cell.take() else {
            return Ok(());
        };
        let Some(row) = self.current_row.as_mut() else {
            return Ok(());
        };

        // Sparse cell: fill the gap up to the 1-based target column.
        if let Some(target) = cell.index {
            while row.len() + 1 < target {
                row.push(RawCell::Missing);
            }
        }

        let value = match cell.text {
            None => RawCell::Missing,
            Some(text) => match cell.kind {
                DataKind::Number => match text.trim().parse::<f64>() {
                    Ok(n) => RawCell::Number(n),
                    Err(_) => RawCell::Text(text),
                },
                DataKind::Boolean => match text.trim() {
                    "1" | "True" | "true" => RawCell::Bool(true),
                    "0" | "False" | "false" => RawCell::Bool(false),
                    _ => RawCell::Text(text),
                },
                DataKind::Other => RawCell::Text(text),
            },
        };
        row.push(value);

        if row.len() > self.max_columns {
            return Err(IngestError::TooManyColumns {
                row: self.grid.len().saturating_sub(1),
                count: row.len(),
                limit: self.max_columns,
            });
        }
        Ok(())
    }
}

fn attr_value(e: &BytesStart, local_name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| IngestError::MalformedWorkbook(err.to_string()))?;
        if attr.key.local_name().as_ref() == local_name {
            let value = attr
                .unescape_value()
                .map_err(|err| IngestError::MalformedWorkbook(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
