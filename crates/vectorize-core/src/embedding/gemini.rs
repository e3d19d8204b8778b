use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ProviderSettings;
use crate::embedding::{EmbeddingProvider, HttpBackend, ModelInfo, preview, validate_texts};
use crate::error::Result;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const LABEL: &str = "Google Gemini";

const KNOWN_MODELS: &[(&str, usize)] = &[("text-embedding-004", 768), ("embedding-001", 768)];

/// Google Gemini embeddings via `embedContent`, one request per text.
pub struct GeminiEmbedding {
    backend: HttpBackend,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GeminiEmbedding {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            backend: HttpBackend::new(LABEL, settings, DEFAULT_BASE_URL),
        }
    }

    /// Model resource name; accepts both `embedding-001` and `models/embedding-001`.
    fn resource(&self) -> String {
        let model = self.backend.model();
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let resource = self.resource();
        let request = self
            .backend
            .post(&format!("/v1beta/{resource}:embedContent"))
            .header("x-goog-api-key", self.backend.api_key())
            .json(&EmbedContentRequest {
                model: resource,
                content: Content {
                    parts: [Part { text }],
                },
                task_type: "RETRIEVAL_DOCUMENT",
            });
        let resp: EmbedContentResponse = self.backend.send(request).await?;
        Ok(resp.embedding.values)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for GeminiEmbedding {
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
        self.backend.model_info(KNOWN_MODELS, 768, false)
    }
}

impl fmt::Display for GeminiEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GeminiEmbedding(model={})", self.backend.model())
    }
}
