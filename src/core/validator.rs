use crate::config::IngestLimits;
use crate::domain::model::UploadMeta;
use crate::utils::error::{IngestError, Result};

/// Metadata-only gate in front of the parser. Checks run in a fixed order and
/// stop at the first failure so the caller always gets one deterministic
/// error: size, then extension, then declared MIME type. Never reads bytes.
pub struct FileValidator;

impl FileValidator {
    pub fn validate(meta: &UploadMeta, limits: &IngestLimits) -> Result<()> {
        if meta.declared_size > limits.max_file_size {
            return Err(IngestError::FileTooLarge {
                actual: meta.declared_size,
                limit: limits.max_file_size,
            });
        }

        let extension = meta.extension().unwrap_or_default();
        if !limits.extension_allowed(&extension) {
            return Err(IngestError::ExtensionNotAllowed { extension });
        }

        if !limits.mime_type_allowed(&meta.declared_mime_type) {
            return Err(IngestError::MimeTypeNotAllowed {
                mime: meta.declared_mime_type.clone(),
            });
        }

        Ok(())
    }
}
