use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("File too large: {actual} bytes (limit {limit})")]
    FileTooLarge { actual: u64, limit: u64 },

    #[error("File extension not allowed: '{extension}'")]
    ExtensionNotAllowed { extension: String },

    #[error("MIME type not allowed: '{mime}'")]
    MimeTypeNotAllowed { mime: String },

    #[error("Workbook contains no sheets")]
    NoSheetsFound,

    #[error("Workbook has too many sheets: {count} (limit {limit})")]
    TooManySheets { count: usize, limit: usize },

    #[error("First worksheet could not be read as a row grid")]
    UnreadableWorksheet,

    #[error("Malformed workbook: {0}")]
    MalformedWorkbook(String),

    #[error("Sheet has too many rows: {count} (limit {limit})")]
    TooManyRows { count: usize, limit: usize },

    #[error("Row {row} has too many columns: {count} (limit {limit})")]
    TooManyColumns {
        row: usize,
        count: usize,
        limit: usize,
    },

    #[error("Too many member names extracted: {count} (limit {limit})")]
    TooManyMembers { count: usize, limit: usize },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Limits file error: {0}")]
    LimitsFileError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Which pipeline stage (or ambient concern) produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Parse,
    Sanitize,
    Extract,
    Config,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}

impl IngestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            IngestError::FileTooLarge { .. }
            | IngestError::ExtensionNotAllowed { .. }
            | IngestError::MimeTypeNotAllowed { .. } => ErrorCategory::Validation,
            IngestError::NoSheetsFound
            | IngestError::TooManySheets { .. }
            | IngestError::UnreadableWorksheet
            | IngestError::MalformedWorkbook(_) => ErrorCategory::Parse,
            IngestError::TooManyRows { .. } | IngestError::TooManyColumns { .. } => {
                ErrorCategory::Sanitize
            }
            IngestError::TooManyMembers { .. } => ErrorCategory::Extract,
            IngestError::InvalidConfigValue { .. } | IngestError::LimitsFileError(_) => {
                ErrorCategory::Config
            }
            IngestError::IoError(_) | IngestError::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // User picked the wrong file; trivially recoverable.
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Parse | ErrorCategory::Sanitize | ErrorCategory::Extract => {
                ErrorSeverity::Medium
            }
            ErrorCategory::Config | ErrorCategory::Io => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            IngestError::FileTooLarge { limit, .. } => {
                format!("The file is too large (limit is {} bytes)", limit)
            }
            IngestError::ExtensionNotAllowed { extension } => format!(
                "'{}' files are not supported; upload a .xls or .xlsx export",
                extension
            ),
            IngestError::MimeTypeNotAllowed { .. } => {
                "The file does not look like an Excel spreadsheet".to_string()
            }
            IngestError::NoSheetsFound | IngestError::UnreadableWorksheet => {
                "The spreadsheet has no readable worksheet".to_string()
            }
            IngestError::MalformedWorkbook(_) => {
                "The file could not be read as a spreadsheet".to_string()
            }
            IngestError::TooManySheets { .. }
            | IngestError::TooManyRows { .. }
            | IngestError::TooManyColumns { .. }
            | IngestError::TooManyMembers { .. } => {
                "The spreadsheet exceeds the allowed size limits".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "Choose a smaller .xls or .xlsx file and try again",
            ErrorCategory::Parse => {
                "Re-export the report from PALMS and upload the fresh file"
            }
            ErrorCategory::Sanitize | ErrorCategory::Extract => {
                "Trim the export down to the member list and try again"
            }
            ErrorCategory::Config => "Check the limits configuration values",
            ErrorCategory::Io => "Check that the file exists and is readable",
        }
    }
}
