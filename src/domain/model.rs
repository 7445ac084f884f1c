use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Upload metadata as declared by the caller (browser file picker, CLI, ...).
/// Validation runs against this alone, before any byte of content is read.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    pub name: String,
    pub declared_size: u64,
    pub declared_mime_type: String,
}

impl UploadMeta {
    pub fn new(
        name: impl Into<String>,
        declared_size: u64,
        declared_mime_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_size,
            declared_mime_type: declared_mime_type.into(),
        }
    }

    /// Lowercased text after the final `.`, or `None` when there is no dot.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
    }
}

/// A fully loaded upload: metadata plus raw bytes. Immutable once built and
/// discarded after one pass through the pipeline.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub meta: UploadMeta,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(meta: UploadMeta, bytes: Vec<u8>) -> Self {
        Self { meta, bytes }
    }

    /// Convenience constructor that declares the size from the buffer itself.
    pub fn from_bytes(
        name: impl Into<String>,
        declared_mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        let meta = UploadMeta::new(name, bytes.len() as u64, declared_mime_type);
        Self { meta, bytes }
    }
}

/// A raw cell value straight out of the workbook decoder, before sanitization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Text(String),
    Number(f64),
    Bool(bool),
    /// The cell exists but holds no usable value (e.g. an error cell).
    Null,
    /// The cell is absent from the sheet entirely.
    Missing,
}

/// One worksheet row after row 1, as an insertion-ordered header -> value
/// mapping. Missing cells are present with `RawCell::Missing`, never absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, RawCell)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, RawCell)>) -> Self {
        Self {
            cells: pairs.into_iter().collect(),
        }
    }

    pub fn push(&mut self, header: impl Into<String>, value: RawCell) {
        self.cells.push((header.into(), value));
    }

    pub fn get(&self, header: &str) -> Option<&RawCell> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawCell)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A sanitized scalar: the only value shapes that survive `RowSanitizer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellScalar {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellScalar {
    /// Stringify the way the extractor sees values: numbers and booleans are
    /// rendered with their natural display form.
    pub fn to_display_string(&self) -> String {
        match self {
            CellScalar::Text(s) => s.clone(),
            CellScalar::Number(n) => n.to_string(),
            CellScalar::Bool(b) => b.to_string(),
        }
    }
}

/// A row after sanitization: cleaned headers mapped to sanitized scalars,
/// preserving the original key order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizedRow {
    cells: Vec<(String, CellScalar)>,
}

impl SanitizedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, value: CellScalar) {
        self.cells.push((header.into(), value));
    }

    pub fn get(&self, header: &str) -> Option<&CellScalar> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    pub fn contains_header(&self, header: &str) -> bool {
        self.cells.iter().any(|(h, _)| h == header)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellScalar)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// View a sanitized row as raw input again. Useful for callers that
    /// re-sanitize already-parsed data; sanitization is idempotent over this.
    pub fn to_raw(&self) -> RawRow {
        RawRow::from_pairs(self.cells.iter().map(|(h, v)| {
            let raw = match v {
                CellScalar::Text(s) => RawCell::Text(s.clone()),
                CellScalar::Number(n) => RawCell::Number(*n),
                CellScalar::Bool(b) => RawCell::Bool(*b),
            };
            (h.clone(), raw)
        }))
    }
}

/// A member's display name assembled from the first/last name columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FullName(String);

impl FullName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FullName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SanitizedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}
