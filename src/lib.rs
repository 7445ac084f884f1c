pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::{CliConfig, LocalFileSource};

pub use crate::config::IngestLimits;
pub use crate::core::pipeline::MemberIngestPipeline;
pub use crate::domain::model::{FullName, UploadMeta, UploadedFile};
pub use crate::domain::ports::FileSource;
pub use crate::utils::error::{IngestError, Result};
