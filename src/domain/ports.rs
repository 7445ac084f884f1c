use crate::utils::error::Result;

/// Where upload bytes come from. Kept behind a port so the pipeline can be
/// driven by a local file (CLI), an in-memory buffer (tests), or whatever the
/// hosting application reads uploads from.
pub trait FileSource: Send + Sync {
    fn read_file(&self, name: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}
