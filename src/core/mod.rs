pub mod extractor;
pub mod parser;
pub mod pipeline;
pub mod sanitizer;
mod sheet_ml;
pub mod validator;

pub use crate::domain::model::{FullName, RawCell, RawRow, SanitizedRow, UploadMeta, UploadedFile};
pub use crate::domain::ports::FileSource;
pub use crate::utils::error::Result;
