use crate::config::IngestLimits;
use crate::core::extractor::NameExtractor;
use crate::core::parser::WorkbookParser;
use crate::core::sanitizer::RowSanitizer;
use crate::core::validator::FileValidator;
use crate::domain::model::{FullName, UploadMeta, UploadedFile};
use crate::domain::ports::FileSource;
use crate::utils::error::{IngestError, Result};

/// The full ingestion pipeline: validate, parse, sanitize, extract.
///
/// Stages run strictly in order and the first failing stage aborts the run.
/// `ingest` is the metadata-first entry point: validation happens before a
/// single byte is requested from the source, so an upload rejected on size,
/// extension or MIME type costs no I/O.
pub struct MemberIngestPipeline {
    limits: IngestLimits,
}

impl MemberIngestPipeline {
    pub fn new(limits: IngestLimits) -> Self {
        Self { limits }
    }

    pub fn with_defaults() -> Self {
        Self::new(IngestLimits::default())
    }

    pub fn limits(&self) -> &IngestLimits {
        &self.limits
    }

    /// Validates the declared metadata, then reads and processes the upload.
    pub async fn ingest<S: FileSource>(
        &self,
        meta: &UploadMeta,
        source: &S,
    ) -> Result<Vec<FullName>> {
        tracing::info!("Starting ingestion of '{}'", meta.name);
        FileValidator::validate(meta, &self.limits)?;

        let bytes = source.read_file(&meta.name).await?;
        self.extract_member_names(&UploadedFile::new(meta.clone(), bytes))
    }

    /// Runs the pipeline over an already-loaded upload.
    pub fn extract_member_names(&self, file: &UploadedFile) -> Result<Vec<FullName>> {
        FileValidator::validate(&file.meta, &self.limits)?;

        // The declared size passed validation; the bytes actually read must
        // honor the same ceiling.
        let actual = file.bytes.len() as u64;
        if actual > self.limits.max_file_size {
            return Err(IngestError::FileTooLarge {
                actual,
                limit: self.limits.max_file_size,
            });
        }

        let raw_rows = WorkbookParser::parse(&file.bytes, &self.limits)?;
        tracing::info!("Parsed {} rows from '{}'", raw_rows.len(), file.meta.name);

        let sanitized = RowSanitizer::sanitize(&raw_rows, &self.limits)?;
        let names = NameExtractor::extract(&sanitized, &self.limits)?;

        tracing::info!(
            "Ingestion of '{}' complete: {} members",
            file.meta.name,
            names.len()
        );
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingSource {
        files: Mutex<HashMap<String, Vec<u8>>>,
        reads: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                files: Mutex::new(HashMap::new()),
                reads: AtomicUsize::new(0),
            }
        }

        fn insert(&self, name: &str, bytes: Vec<u8>) {
            self.files.lock().unwrap().insert(name.to_string(), bytes);
        }

        fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl FileSource for CountingSource {
        async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.files
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| {
                    IngestError::IoError(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        name.to_string(),
                    ))
                })
        }
    }

    fn member_export() -> Vec<u8> {
        "<?xml version=\"1.0\"?>\
         <Workbook xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\
         <Worksheet ss:Name=\"Members\"><Table>\
         <Row><Cell><Data ss:Type=\"String\">First Name</Data></Cell>\
         <Cell><Data ss:Type=\"String\">Last Name</Data></Cell></Row>\
         <Row><Cell><Data ss:Type=\"String\">Aisha</Data></Cell>\
         <Cell><Data ss:Type=\"String\">Khan</Data></Cell></Row>\
         </Table></Worksheet></Workbook>"
            .as_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn test_ingest_end_to_end() {
        let source = CountingSource::new();
        source.insert("members.xls", member_export());

        let pipeline = MemberIngestPipeline::with_defaults();
        let meta = UploadMeta::new("members.xls", member_export().len() as u64, "");
        let names = pipeline.ingest(&meta, &source).await.unwrap();

        assert_eq!(names, vec![FullName::new("Aisha Khan")]);
        assert_eq!(source.read_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_metadata_never_touches_the_source() {
        let source = CountingSource::new();
        source.insert("members.xls", member_export());

        let pipeline = MemberIngestPipeline::with_defaults();
        let meta = UploadMeta::new("members.xls", 11 * 1024 * 1024, "");
        let result = pipeline.ingest(&meta, &source).await;

        assert!(matches!(result, Err(IngestError::FileTooLarge { .. })));
        assert_eq!(source.read_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_extension_never_touches_the_source() {
        let source = CountingSource::new();
        let pipeline = MemberIngestPipeline::with_defaults();
        let meta = UploadMeta::new("members.csv", 128, "");
        let result = pipeline.ingest(&meta, &source).await;

        assert!(matches!(result, Err(IngestError::ExtensionNotAllowed { .. })));
        assert_eq!(source.read_count(), 0);
    }

    #[test]
    fn test_actual_bytes_checked_against_the_size_limit() {
        let small = IngestLimits {
            max_file_size: 64,
            ..Default::default()
        };
        let pipeline = MemberIngestPipeline::new(small);
        // Declared size is within the limit, actual bytes are not.
        let meta = UploadMeta::new("members.xls", 10, "");
        let file = UploadedFile::new(meta, member_export());

        assert!(matches!(
            pipeline.extract_member_names(&file),
            Err(IngestError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_parser_errors_surface_through_the_pipeline() {
        let pipeline = MemberIngestPipeline::with_defaults();
        let file = UploadedFile::from_bytes("members.xls", "", b"garbage".to_vec());
        assert!(matches!(
            pipeline.extract_member_names(&file),
            Err(IngestError::MalformedWorkbook(_))
        ));
    }
}
