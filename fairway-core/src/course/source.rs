use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, path::PathBuf, sync::Arc, time::Duration};

use crate::error::DatasetError;

/// Somewhere a course dataset document can be read from.
#[async_trait]
pub trait DatasetSource: Send + Sync + Debug {
    /// Human-readable origin used in logs and errors.
    fn describe(&self) -> String;

    /// Raw document body.
    async fn fetch(&self) -> Result<String, DatasetError>;
}

/// Build a source from a config string: `http(s)://` URLs are fetched,
/// anything else is treated as a local path.
pub fn source_from_location(location: &str, timeout: Duration) -> Arc<dyn DatasetSource> {
    let trimmed = location.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Arc::new(HttpSource::new(trimmed, timeout))
    } else {
        Arc::new(FileSource::new(trimmed))
    }
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String, DatasetError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| DatasetError::Io { path: self.path.clone(), source })
    }
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    timeout: Duration,
    http: Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self { url: url.into(), timeout, http: Client::new() }
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String, DatasetError> {
        let request = async {
            let res = self
                .http
                .get(&self.url)
                .send()
                .await
                .map_err(|e| DatasetError::Http { url: self.url.clone(), reason: e.to_string() })?;

            let status = res.status();
            if !status.is_success() {
                return Err(DatasetError::Status { url: self.url.clone(), status: status.as_u16() });
            }

            res.text()
                .await
                .map_err(|e| DatasetError::Http { url: self.url.clone(), reason: e.to_string() })
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| DatasetError::Timeout { url: self.url.clone(), after: self.timeout })?
    }
}

/// A document compiled into the binary.
#[derive(Debug, Clone)]
pub struct EmbeddedSource {
    name: &'static str,
    body: &'static str,
}

impl EmbeddedSource {
    pub const fn new(name: &'static str, body: &'static str) -> Self {
        Self { name, body }
    }
}

#[async_trait]
impl DatasetSource for EmbeddedSource {
    fn describe(&self) -> String {
        self.name.to_string()
    }

    async fn fetch(&self) -> Result<String, DatasetError> {
        Ok(self.body.to_string())
    }
}
