use crate::config::IngestLimits;
use crate::domain::model::{CellScalar, RawCell, RawRow, SanitizedRow};
use crate::utils::error::{IngestError, Result};

/// Identifiers that must never survive as row keys. Assigning to any of these
/// on a plain object in property-assignment semantics tampers with shared
/// behavior (prototype pollution), so a crafted column header matching one of
/// them is dropped outright.
const RESERVED_HEADERS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Neutralizes every cell and header coming out of the parser.
///
/// Structural violations (too many rows, too many columns) fail the whole
/// call: shape explosion is a resource-exhaustion risk. Individual bad cells
/// are never an error; they are normalized in place, and callers must not
/// expect merely ugly data to be rejected. Sanitization is idempotent.
pub struct RowSanitizer;

impl RowSanitizer {
    pub fn sanitize(rows: &[RawRow], limits: &IngestLimits) -> Result<Vec<SanitizedRow>> {
        if rows.len() > limits.max_rows {
            return Err(IngestError::TooManyRows {
                count: rows.len(),
                limit: limits.max_rows,
            });
        }

        rows.iter()
            .enumerate()
            .map(|(index, row)| Self::sanitize_row(index, row, limits))
            .collect()
    }

    fn sanitize_row(index: usize, row: &RawRow, limits: &IngestLimits) -> Result<SanitizedRow> {
        if row.len() > limits.max_columns {
            return Err(IngestError::TooManyColumns {
                row: index,
                count: row.len(),
                limit: limits.max_columns,
            });
        }

        let mut out = SanitizedRow::new();
        for (header, value) in row.iter() {
            let Some(clean) = clean_header(header) else {
                continue;
            };
            out.push(clean, clean_value(value, limits));
        }
        Ok(out)
    }
}

/// Strips a header down to letters, digits and spaces. Returns `None` (drop
/// the key and its value entirely) when the raw or cleaned header matches a
/// reserved identifier, or when nothing printable is left.
fn clean_header(raw: &str) -> Option<String> {
    if is_reserved(raw.trim()) {
        return None;
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();

    if cleaned.trim().is_empty() || is_reserved(&cleaned) {
        return None;
    }
    Some(cleaned)
}

fn is_reserved(header: &str) -> bool {
    RESERVED_HEADERS
        .iter()
        .any(|reserved| header.eq_ignore_ascii_case(reserved))
}

fn clean_value(value: &RawCell, limits: &IngestLimits) -> CellScalar {
    match value {
        RawCell::Null | RawCell::Missing => CellScalar::Text(String::new()),
        RawCell::Text(s) => CellScalar::Text(clean_text(s, limits.max_cell_length)),
        RawCell::Number(n) if !n.is_finite() => CellScalar::Number(0.0),
        RawCell::Number(n) => CellScalar::Number(*n),
        RawCell::Bool(b) => CellScalar::Bool(*b),
    }
}

/// Removes C0 control characters and DEL, then truncates to `max_len`
/// characters. Truncation is lossy by design; an oversized cell is not worth
/// failing the upload over.
fn clean_text(value: &str, max_len: usize) -> String {
    value
        .chars()
        .filter(|c| {
            let code = *c as u32;
            code >= 0x20 && code != 0x7F
        })
        .take(max_len)
        .collect()
}
