#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_list, validate_positive_number, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Structural and content ceilings for one ingestion run. Built once, never
/// mutated afterwards; every pipeline stage reads the same instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestLimits {
    /// Maximum declared upload size in bytes.
    pub max_file_size: u64,
    /// Allowed file extensions, compared case-insensitively without the dot.
    pub allowed_extensions: Vec<String>,
    /// Allowed declared MIME types. An empty declared type skips this check
    /// (browsers routinely omit it); an empty list disables it entirely.
    pub allowed_mime_types: Vec<String>,
    pub max_sheets: usize,
    pub max_rows: usize,
    pub max_columns: usize,
    /// Maximum length of a sanitized string cell, in characters.
    pub max_cell_length: usize,
    pub max_members: usize,
    /// Maximum length of a first or last name before name sanitization.
    pub max_name_length: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_extensions: vec!["xls".to_string(), "xlsx".to_string()],
            allowed_mime_types: vec![
                "application/vnd.ms-excel".to_string(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ],
            max_sheets: 10,
            max_rows: 10_000,
            max_columns: 100,
            max_cell_length: 1_000,
            max_members: 1_000,
            max_name_length: 50,
        }
    }
}

impl IngestLimits {
    /// Load limits from a TOML file. Missing keys fall back to the defaults;
    /// the result is validated before being returned.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let limits: IngestLimits = toml::from_str(&text)?;
        limits.validate()?;
        Ok(limits)
    }

    pub fn extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }

    pub fn mime_type_allowed(&self, mime: &str) -> bool {
        mime.is_empty()
            || self.allowed_mime_types.is_empty()
            || self
                .allowed_mime_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(mime))
    }
}

impl Validate for IngestLimits {
    fn validate(&self) -> Result<()> {
        validate_positive_number("max_file_size", self.max_file_size as usize, 1)?;
        validate_non_empty_list("allowed_extensions", &self.allowed_extensions)?;
        validate_positive_number("max_sheets", self.max_sheets, 1)?;
        validate_positive_number("max_rows", self.max_rows, 1)?;
        validate_positive_number("max_columns", self.max_columns, 1)?;
        validate_positive_number("max_cell_length", self.max_cell_length, 1)?;
        validate_positive_number("max_members", self.max_members, 1)?;
        validate_positive_number("max_name_length", self.max_name_length, 1)?;
        Ok(())
    }
}
