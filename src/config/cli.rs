use crate::domain::ports::FileSource;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, Validate};
use clap::Parser;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "palms-ingest")]
#[command(about = "Extract member names from untrusted PALMS spreadsheet exports")]
pub struct CliConfig {
    /// Path to the .xls/.xlsx export to ingest
    #[arg(long)]
    pub input: String,

    /// Optional TOML file overriding the default ingestion limits
    #[arg(long)]
    pub limits: Option<String>,

    /// Declared MIME type of the upload (empty skips the MIME check)
    #[arg(long, default_value = "")]
    pub mime_type: String,

    /// Emit the extracted names as a JSON array
    #[arg(long)]
    pub json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("input", &self.input)?;
        Ok(())
    }
}

/// Reads upload bytes from the local filesystem, rooted at a base directory.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    base_path: String,
}

impl LocalFileSource {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl FileSource for LocalFileSource {
    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(name);
        let data = std::fs::read(full_path)?;
        Ok(data)
    }
}
