use bytes::Bytes;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use spark_inference::inference::sam::Embedding;
use spark_inference::CodecError;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Embedding service answered {0}")]
    Status(StatusCode),

    #[error("Unexpected embedding response: {0}")]
    Payload(String),

    #[error("Failed to read embedding file {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Produces the embedding of an encoded image.
pub trait EmbeddingSource: Send + Sync {
    fn fetch(&self, image: Bytes) -> impl Future<Output = Result<Embedding, EmbeddingError>> + Send;
}

/// POSTs the raw image bytes to a remote embedding endpoint.
pub struct HttpEmbeddingSource {
    client: Client,
    url: String,
}

impl HttpEmbeddingSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl EmbeddingSource for HttpEmbeddingSource {
    async fn fetch(&self, image: Bytes) -> Result<Embedding, EmbeddingError> {
        let started = Instant::now();
        debug!("Requesting embedding for {} bytes from {}", image.len(), self.url);

        let response = self.client.post(&self.url).body(image).send().await?;
        if !response.status().is_success() {
            return Err(EmbeddingError::Status(response.status()));
        }

        let body: Value = response.json().await?;
        let embedding = parse_embedding_response(&body)?;
        info!("Embedding received in {:?}", started.elapsed());

        Ok(embedding)
    }
}

/// Reads a previously saved embedding: either the service's JSON response or
/// the bare base64 blob.
pub struct FileEmbeddingSource {
    path: PathBuf,
}

impl FileEmbeddingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EmbeddingSource for FileEmbeddingSource {
    async fn fetch(&self, _image: Bytes) -> Result<Embedding, EmbeddingError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| EmbeddingError::File {
                path: self.path.clone(),
                source,
            })?;

        let text = text.trim();
        if text.starts_with('[') {
            let body: Value = serde_json::from_str(text)
                .map_err(|e| EmbeddingError::Payload(e.to_string()))?;
            parse_embedding_response(&body)
        } else {
            Ok(Embedding::from_base64(text)?)
        }
    }
}

/// The service answers with a JSON array whose first element is the base64 blob.
pub fn parse_embedding_response(body: &Value) -> Result<Embedding, EmbeddingError> {
    let blob = body
        .as_array()
        .ok_or_else(|| EmbeddingError::Payload("expected a JSON array".to_string()))?
        .first()
        .ok_or_else(|| EmbeddingError::Payload("empty array".to_string()))?
        .as_str()
        .ok_or_else(|| EmbeddingError::Payload("first element is not a string".to_string()))?;

    Ok(Embedding::from_base64(blob)?)
}
