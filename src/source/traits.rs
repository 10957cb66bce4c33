use crate::model::SourceError;

/// Fetches a document body by URL. Non-success statuses are errors.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, SourceError>;
}
