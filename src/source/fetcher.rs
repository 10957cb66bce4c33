use crate::model::SourceError;
use crate::source::Fetcher;

use reqwest::Client;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) MenuSheetSync/0.1")
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::BadResponse(status.as_u16()));
        }

        response.text().await.map_err(|e| SourceError::Http(e.to_string()))
    }
}
