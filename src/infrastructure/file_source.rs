// Local file source for logger output
use crate::application::record_source::{RecordSource, SourceError};
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileSource {
    location: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            location: path.display().to_string(),
            path,
        }
    }
}

#[async_trait]
impl RecordSource for FileSource {
    fn location(&self) -> &str {
        &self.location
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SourceError::Io {
                location: self.location.clone(),
                source: e,
            })?;

        // Logger files are not guaranteed to be UTF-8 (unit rows, degree signs)
        let text = String::from_utf8_lossy(&bytes).into_owned();
        if text.trim().is_empty() {
            return Err(SourceError::Empty {
                location: self.location.clone(),
            });
        }

        Ok(text)
    }
}
