use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ProviderSettings;
use crate::embedding::{EmbeddingProvider, HttpBackend, ModelInfo, preview, validate_texts};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const LABEL: &str = "Anthropic";

const KNOWN_MODELS: &[(&str, usize)] = &[
    ("text-embedding-3-large", 3072),
    ("text-embedding-3-small", 1536),
];

/// Anthropic-hosted embeddings, one request per text.
pub struct AnthropicEmbedding {
    backend: HttpBackend,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

// Either `{"embedding": [...]}` or the list form `{"data": [{"embedding": [...]}]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Single { embedding: Vec<f32> },
    List { data: Vec<EmbeddingData> },
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_vector(self) -> Option<Vec<f32>> {
        match self {
            EmbeddingResponse::Single { embedding } => Some(embedding),
            EmbeddingResponse::List { data } => data.into_iter().next().map(|d| d.embedding),
        }
    }
}

impl AnthropicEmbedding {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            backend: HttpBackend::new(LABEL, settings, DEFAULT_BASE_URL),
        }
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let request = self
            .backend
            .post("/v1/embeddings")
            .header("x-api-key", self.backend.api_key())
            .header("anthropic-version", API_VERSION)
            .json(&EmbeddingRequest {
                model: self.backend.model(),
                input: text,
            });
        let resp: EmbeddingResponse = self.backend.send(request).await?;
        resp.into_vector()
            .ok_or_else(|| Error::provider(LABEL, "empty response"))
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for AnthropicEmbedding {
    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        validate_texts(texts)?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            tracing::debug!("Processing text {}/{}: {}", i + 1, texts.len(), preview(text));
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }

    fn model_info(&self) -> ModelInfo {
        self.backend.model_info(KNOWN_MODELS, 1536, false)
    }
}

impl fmt::Display for AnthropicEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnthropicEmbedding(model={})", self.backend.model())
    }
}
