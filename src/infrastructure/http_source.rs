// HTTP source for logger files published on a web server
use crate::application::record_source::{RecordSource, SourceError};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Http {
                location: url.clone(),
                source: e,
            })?;
        Ok(Self { url, client })
    }

    async fn fetch_bytes(&self) -> Result<Bytes, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Http {
                location: self.url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                location: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        response.bytes().await.map_err(|e| SourceError::Http {
            location: self.url.clone(),
            source: e,
        })
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        let bytes = self.fetch_bytes().await?;
        tracing::debug!("Fetched {} bytes from {}", bytes.len(), self.url);

        let text = String::from_utf8_lossy(&bytes).into_owned();
        if text.trim().is_empty() {
            return Err(SourceError::Empty {
                location: self.url.clone(),
            });
        }

        Ok(text)
    }
}
